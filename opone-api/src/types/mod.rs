//! Request/response types for the OpOne REST API.
//!
//! Response payloads reuse the `opone-core` entity structs directly; the
//! aliases here exist so handlers read in terms of wire types. Request
//! types (create/update/list filters) are defined per entity module.

pub mod client;
pub mod communication;
pub mod envelope;
pub mod metrics;
pub mod opportunity;
pub mod project;
pub mod session;
pub mod team_member;
pub mod transaction;

pub use client::*;
pub use communication::*;
pub use envelope::*;
pub use metrics::*;
pub use opportunity::*;
pub use project::*;
pub use session::*;
pub use team_member::*;
pub use transaction::*;
