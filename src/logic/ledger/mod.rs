//! Event Ledger
//!
//! Append-only store of detection and success signals per session.
//! No update or delete exists for events; `session_health` is a cache
//! that the risk scorer refreshes.
//!
//! ## Structure
//! - `types`: DetectionEvent, DetectionKind, SessionHealthRecord
//! - `store`: SQLite ledger (thread-safe)

pub mod types;
pub mod store;


pub use types::{DetectionEvent, DetectionKind, SessionHealthRecord, SessionStatus};
pub use store::Ledger;
