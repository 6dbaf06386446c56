//! Logic Module - Detection Risk & Countermeasures
//!
//! ## Structure
//! - `ledger/` - Append-only detection event store (SQLite)
//! - `risk/` - Time-decayed risk score and escalation verdict
//! - `egress/` - Egress health registry and best-candidate selection
//! - `pacing/` - Adaptive per-session action delays
//! - `countermeasure/` - Per-session detect/react/cool-down state machine
//! - `lookup` - Current egress address lookup
//! - `guard` - Front-end facade over all of the above

pub mod config;
pub mod error;

// Shared state
pub mod ledger;
pub mod egress;
pub mod pacing;

// Engines
pub mod risk;
pub mod lookup;
pub mod countermeasure;

pub mod guard;

pub use config::GuardConfig;
pub use guard::Guard;
