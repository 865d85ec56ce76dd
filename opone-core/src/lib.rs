//! OpOne Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod entities;
pub mod enums;
pub mod error;

pub use entities::*;
pub use enums::*;
pub use error::*;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Monetary amount in integer cents. Avoids floating-point drift in
/// financial aggregation.
pub type Cents = i64;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_v7() {
        let id = new_entity_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_entity_ids_sort_by_creation() {
        let first = new_entity_id();
        let second = new_entity_id();
        // UUIDv7 is timestamp-prefixed; later IDs never sort before earlier ones.
        assert!(first <= second);
    }
}
