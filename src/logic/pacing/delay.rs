//! Adaptive Delay Controller
//!
//! Streak-driven pacing multiplier. Streak counters damp each other but
//! are never reset, so a threshold that fires keeps firing on every call
//! while it holds.

use std::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_BASE_DELAY_SECS;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MIN_MULTIPLIER: f64 = 0.5;
pub const MAX_MULTIPLIER: f64 = 5.0;

/// Failure streak above this slows pacing down
const FAILURE_STREAK_LIMIT: u32 = 3;
/// Success streak above this speeds pacing up
const SUCCESS_STREAK_LIMIT: u32 = 5;

const SLOWDOWN_FACTOR: f64 = 1.5;
const SPEEDUP_FACTOR: f64 = 0.9;
const ESCALATION_FACTOR: f64 = 2.0;

/// Jitter range applied to every delay
const JITTER_MIN: f64 = 0.5;
const JITTER_MAX: f64 = 1.5;

// ============================================================================
// STATE
// ============================================================================

/// Snapshot of a controller, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayState {
    pub base_delay_secs: f64,
    pub multiplier: f64,
    pub success_streak: u32,
    pub failure_streak: u32,
}

pub struct DelayController {
    base_delay_secs: f64,
    multiplier: f64,
    success_streak: u32,
    failure_streak: u32,
    rng: StdRng,
}

impl DelayController {
    pub fn new(base_delay_secs: f64) -> Self {
        Self::with_rng(base_delay_secs, StdRng::from_entropy())
    }

    /// Deterministic jitter (for testing)
    pub fn with_seed(base_delay_secs: f64, seed: u64) -> Self {
        Self::with_rng(base_delay_secs, StdRng::seed_from_u64(seed))
    }

    fn with_rng(base_delay_secs: f64, rng: StdRng) -> Self {
        Self {
            base_delay_secs: base_delay_secs.max(0.0).min(MAX_BASE_DELAY_SECS),
            multiplier: 1.0,
            success_streak: 0,
            failure_streak: 0,
            rng,
        }
    }

    /// Adjust the multiplier from the current streaks and draw a jittered delay
    pub fn next_delay(&mut self) -> Duration {
        if self.failure_streak > FAILURE_STREAK_LIMIT {
            self.multiplier = (self.multiplier * SLOWDOWN_FACTOR).min(MAX_MULTIPLIER);
        } else if self.success_streak > SUCCESS_STREAK_LIMIT {
            self.multiplier = (self.multiplier * SPEEDUP_FACTOR).max(MIN_MULTIPLIER);
        }

        let jitter = self.rng.gen_range(JITTER_MIN..JITTER_MAX);
        let secs = self.base_delay_secs * self.multiplier * jitter;
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn report_outcome(&mut self, success: bool) {
        if success {
            self.success_streak += 1;
            self.failure_streak = self.failure_streak.saturating_sub(1);
        } else {
            self.failure_streak += 1;
            self.success_streak = self.success_streak.saturating_sub(1);
        }
    }

    /// Cooldown escalation: double the multiplier outside the streak logic
    pub fn escalate(&mut self) {
        let before = self.multiplier;
        self.multiplier = (self.multiplier * ESCALATION_FACTOR).min(MAX_MULTIPLIER);
        log::info!("Pacing multiplier escalated {:.2} -> {:.2}", before, self.multiplier);
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn state(&self) -> DelayState {
        DelayState {
            base_delay_secs: self.base_delay_secs,
            multiplier: self.multiplier,
            success_streak: self.success_streak,
            failure_streak: self.failure_streak,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_base_delay_is_capped() {
        let mut ctl = DelayController::with_seed(1e300, 1);
        assert_eq!(ctl.state().base_delay_secs, MAX_BASE_DELAY_SECS);

        for _ in 0..10 {
            ctl.escalate();
            let delay = ctl.next_delay();
            assert!(delay <= Duration::from_secs_f64(MAX_BASE_DELAY_SECS * MAX_MULTIPLIER * JITTER_MAX));
        }
    }

    #[test]
    fn test_nan_base_delay_is_zero() {
        let mut ctl = DelayController::with_seed(f64::NAN, 1);
        assert_eq!(ctl.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_four_failures_raise_multiplier() {
        let mut ctl = DelayController::with_seed(2.0, 7);
        let before = ctl.multiplier();

        for _ in 0..4 {
            ctl.report_outcome(false);
        }
        ctl.next_delay();

        assert!(ctl.multiplier() > before);
    }

    #[test]
    fn test_three_failures_do_not_trigger() {
        let mut ctl = DelayController::with_seed(2.0, 7);
        for _ in 0..3 {
            ctl.report_outcome(false);
        }
        ctl.next_delay();
        assert_eq!(ctl.multiplier(), 1.0);
    }

    #[test]
    fn test_sticky_ramp_keeps_growing() {
        let mut ctl = DelayController::with_seed(2.0, 1);
        for _ in 0..4 {
            ctl.report_outcome(false);
        }
        ctl.next_delay();
        let first = ctl.multiplier();
        ctl.next_delay();
        assert!(ctl.multiplier() > first);
        assert!((ctl.multiplier() - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_ceiling() {
        let mut ctl = DelayController::with_seed(2.0, 1);
        for _ in 0..10 {
            ctl.report_outcome(false);
        }
        for _ in 0..20 {
            ctl.next_delay();
        }
        assert_eq!(ctl.multiplier(), MAX_MULTIPLIER);
    }

    #[test]
    fn test_success_streak_lowers_multiplier_to_floor() {
        let mut ctl = DelayController::with_seed(2.0, 1);
        for _ in 0..6 {
            ctl.report_outcome(true);
        }
        ctl.next_delay();
        assert!((ctl.multiplier() - 0.9).abs() < 1e-9);

        for _ in 0..50 {
            ctl.next_delay();
        }
        assert_eq!(ctl.multiplier(), MIN_MULTIPLIER);
    }

    #[test]
    fn test_streaks_damp_each_other() {
        let mut ctl = DelayController::with_seed(2.0, 1);
        for _ in 0..3 {
            ctl.report_outcome(true);
        }
        ctl.report_outcome(false);

        let state = ctl.state();
        assert_eq!(state.success_streak, 2);
        assert_eq!(state.failure_streak, 1);

        ctl.report_outcome(true);
        assert_eq!(ctl.state().failure_streak, 0);
    }

    #[test]
    fn test_delay_within_jitter_bounds() {
        let mut ctl = DelayController::with_seed(2.0, 42);
        for _ in 0..100 {
            let d = ctl.next_delay().as_secs_f64();
            assert!((1.0..=3.0).contains(&d), "delay {} out of range", d);
        }
    }

    #[test]
    fn test_escalate_doubles_up_to_ceiling() {
        let mut ctl = DelayController::with_seed(2.0, 1);
        ctl.escalate();
        assert_eq!(ctl.multiplier(), 2.0);
        ctl.escalate();
        ctl.escalate();
        assert_eq!(ctl.multiplier(), MAX_MULTIPLIER);
    }

    #[test]
    fn test_zero_base_delay() {
        let mut ctl = DelayController::with_seed(0.0, 1);
        assert_eq!(ctl.next_delay(), Duration::ZERO);
    }
}
