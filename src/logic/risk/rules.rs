//! Risk Scoring Rules
//!
//! Weights and limits for the decay score. Constants only - no logic
//! beyond the table lookup.

use crate::logic::ledger::DetectionKind;

// ============================================================================
// WINDOW
// ============================================================================

/// Events older than this are ignored
pub const SCORING_WINDOW_HOURS: i64 = 24;

/// Floor of the linear decay so a day-old event still counts a little
pub const MIN_TIME_WEIGHT: f64 = 0.1;

// ============================================================================
// BOUNDS
// ============================================================================

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Score strictly above this escalates. Fixed for every session.
pub const ESCALATION_THRESHOLD: f64 = 5.0;

// ============================================================================
// WEIGHTS
// ============================================================================

pub const BLOCK_WEIGHT: f64 = 5.0;
pub const CAPTCHA_WEIGHT: f64 = 3.0;
pub const SUSPICIOUS_WEIGHT: f64 = 1.5;
/// Successes pull the score down but never below `MIN_SCORE`
pub const SUCCESS_WEIGHT: f64 = -0.5;

pub fn weight(kind: DetectionKind) -> f64 {
    match kind {
        DetectionKind::Block => BLOCK_WEIGHT,
        DetectionKind::Captcha => CAPTCHA_WEIGHT,
        DetectionKind::Suspicious => SUSPICIOUS_WEIGHT,
        DetectionKind::Success => SUCCESS_WEIGHT,
    }
}

/// Linear decay over the window, floored at `MIN_TIME_WEIGHT`
pub fn time_weight(age_hours: f64) -> f64 {
    let age = age_hours.max(0.0);
    (1.0 - age / SCORING_WINDOW_HOURS as f64).max(MIN_TIME_WEIGHT)
}
