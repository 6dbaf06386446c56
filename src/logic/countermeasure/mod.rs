//! Countermeasure Module
//!
//! Ties the ledger, risk scorer, egress registry and pacing into one
//! detect -> classify -> react -> cool down cycle per session.
//!
//! ## Structure
//! - `driver`: collaborator trait, indicators, action requests
//! - `classify`: page content -> detection kind
//! - `captcha`: manual resolution gate
//! - `behavior`: simulated activity kinds
//! - `cancel`: cancellation token for blocking points
//! - `types`: states, triggers, outcomes
//! - `orchestrator`: the state machine

pub mod driver;
pub mod classify;
pub mod captcha;
pub mod behavior;
pub mod cancel;
pub mod types;
pub mod orchestrator;


pub use driver::{ActionRequest, Indicator, SessionDriver, PROBE_ORDER};
pub use classify::classify_content;
pub use captcha::{CaptchaResolution, CaptchaResolver, ManualCaptchaGate};
pub use behavior::Behavior;
pub use cancel::{CancelToken, Cancelled};
pub use types::{ActionOutcome, HandlingReport, OrchestratorState, StateChange, Trigger};
pub use orchestrator::{Orchestrator, SessionDeps};
