//! Risk Guard
//!
//! Per-session detection risk scoring, adaptive pacing, egress rotation and
//! a countermeasure state machine for automated browser sessions.

pub mod constants;
pub mod logic;

pub use logic::countermeasure::{ActionOutcome, ActionRequest, Orchestrator, SessionDriver};
pub use logic::error::{GuardError, OrchestratorError, PersistenceError};
pub use logic::ledger::{DetectionEvent, DetectionKind};
pub use logic::risk::SessionRiskState;
pub use logic::{Guard, GuardConfig};
