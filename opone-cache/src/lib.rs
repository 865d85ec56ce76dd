//! In-process TTL cache with substring-pattern invalidation.
//!
//! This crate provides the read-through accelerator used by the OpOne query
//! layer. It is a best-effort cache: the system must behave correctly if
//! every operation here were a no-op. Entries expire after a per-entry TTL,
//! staleness is re-checked lazily on read, and a periodic sweep exists only
//! to bound memory in a long-lived process.
//!
//! # Invalidation Model
//!
//! Invalidation is substring-based: [`TtlCache::clear_matching`] removes
//! every key that contains the given pattern. Mutating code paths clear the
//! key spaces that could include the mutated record - broadly by entity tag,
//! and targeted by embedding the record id in the pattern. [`QueryKey`]
//! renders keys deterministically so that the same logical query always maps
//! to the same key and record ids always appear verbatim in keys that depend
//! on them.
//!
//! # Concurrency
//!
//! All operations are synchronous map operations; there is no await point
//! inside `get`/`set`/`delete`/`clear`. Two concurrent cache-aside misses
//! for the same key will both fetch and both `set`; the last write wins.
//! That duplicate-fetch behavior is deliberate - there is no single-flight
//! de-duplication.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use opone_cache::TtlCache;
//!
//! let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(300));
//! cache.set("projects_id=123", "payload".to_string());
//! assert_eq!(cache.get("projects_id=123").as_deref(), Some("payload"));
//!
//! // A project mutation invalidates every key mentioning the record.
//! cache.clear_matching("123");
//! assert!(cache.get("projects_id=123").is_none());
//! ```

pub mod clock;
pub mod entry;
pub mod key;
pub mod ttl;

pub use clock::{CacheClock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::QueryKey;
pub use ttl::{CacheStats, TtlCache};
