//! Risk Module
//!
//! Turns a session's recent ledger entries into one bounded, time-decayed
//! risk number and the escalation verdict derived from it.
//!
//! ## Structure
//! - `rules`: weights, window and threshold constants
//! - `types`: SessionRiskState
//! - `scorer`: score computation over the ledger

pub mod rules;
pub mod types;
pub mod scorer;

pub use types::SessionRiskState;
pub use scorer::{compute_score, RiskScorer};
pub use rules::ESCALATION_THRESHOLD;
