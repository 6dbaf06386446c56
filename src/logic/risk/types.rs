//! Risk Types

use serde::{Deserialize, Serialize};

use crate::logic::ledger::SessionStatus;

/// Derived per-session risk view, recomputed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRiskState {
    pub session_id: String,
    /// Always within [0.0, 10.0]
    pub risk_score: f64,
    pub status: SessionStatus,
}
