//! Countermeasure Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::captcha::CaptchaResolution;
use crate::logic::ledger::DetectionKind;

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Active,
    Handling(DetectionKind),
    Cooldown,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorState::Active => write!(f, "ACTIVE"),
            OrchestratorState::Handling(kind) => write!(f, "HANDLING({})", kind),
            OrchestratorState::Cooldown => write!(f, "COOLDOWN"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub from: OrchestratorState,
    pub to: OrchestratorState,
    pub at: DateTime<Utc>,
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// What sent the session into handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Pre-action probe found an indicator; the action was not attempted
    Probe,
    /// The action itself failed
    ActionFailed,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Probe => "probe",
            Trigger::ActionFailed => "action_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlingReport {
    pub trigger: Trigger,
    pub kind: DetectionKind,
    /// Set only for captcha classifications
    pub captcha: Option<CaptchaResolution>,
    /// Cooldowns entered while handling (block and score checks are independent)
    pub cooldowns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Completed,
    Handled(HandlingReport),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }

    pub fn report(&self) -> Option<&HandlingReport> {
        match self {
            ActionOutcome::Completed => None,
            ActionOutcome::Handled(report) => Some(report),
        }
    }
}
