//! Guard Configuration
//!
//! Runtime knobs for pacing, cooldown and captcha handling.
//! Scoring weights and the escalation threshold live in `risk::rules`
//! and are not configurable.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use super::egress::SelectionStrategy;
use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// SQLite ledger location
    pub db_path: PathBuf,

    /// Optional JSON file listing egress points
    pub egress_file: Option<PathBuf>,

    /// Optional JSON file listing client signatures to rotate through
    pub signature_file: Option<PathBuf>,
    pub signature_strategy: SelectionStrategy,

    /// Pacing base delay (seconds)
    pub base_delay_secs: f64,

    /// Cooldown pause window (seconds, inclusive)
    pub cooldown_min_secs: u64,
    pub cooldown_max_secs: u64,

    /// Captcha wait limit; `None` waits until resolved or cancelled
    pub captcha_timeout_secs: Option<u64>,

    /// IP echo endpoint and its timeout
    pub lookup_url: String,
    pub lookup_timeout_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(constants::DEFAULT_DB_FILE),
            egress_file: None,
            signature_file: None,
            signature_strategy: SelectionStrategy::LeastUsed,
            base_delay_secs: constants::DEFAULT_BASE_DELAY_SECS,
            cooldown_min_secs: constants::DEFAULT_COOLDOWN_MIN_SECS,
            cooldown_max_secs: constants::DEFAULT_COOLDOWN_MAX_SECS,
            captcha_timeout_secs: Some(constants::DEFAULT_CAPTCHA_TIMEOUT_SECS),
            lookup_url: constants::DEFAULT_LOOKUP_URL.to_string(),
            lookup_timeout_secs: constants::DEFAULT_LOOKUP_TIMEOUT_SECS,
        }
    }
}

impl GuardConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let captcha_timeout = constants::get_captcha_timeout_secs();
        Self {
            db_path: constants::get_db_path(),
            egress_file: constants::get_egress_file(),
            signature_file: constants::get_signature_file(),
            signature_strategy: SelectionStrategy::parse(&constants::get_signature_strategy()),
            base_delay_secs: constants::get_base_delay_secs(),
            cooldown_min_secs: constants::get_cooldown_min_secs(),
            cooldown_max_secs: constants::get_cooldown_max_secs(),
            captcha_timeout_secs: (captcha_timeout > 0).then_some(captcha_timeout),
            lookup_url: constants::get_lookup_url(),
            lookup_timeout_secs: constants::get_lookup_timeout_secs(),
        }
    }

    /// Cooldown window as durations, lower bound first. Both bounds are
    /// capped at `MAX_WAIT_SECS`.
    pub fn cooldown_window(&self) -> (Duration, Duration) {
        let min = self.cooldown_min_secs.min(constants::MAX_WAIT_SECS);
        let max = self.cooldown_max_secs.min(constants::MAX_WAIT_SECS);
        (Duration::from_secs(min.min(max)), Duration::from_secs(min.max(max)))
    }

    pub fn captcha_timeout(&self) -> Option<Duration> {
        self.captcha_timeout_secs
            .map(|secs| Duration::from_secs(secs.min(constants::MAX_WAIT_SECS)))
    }

    /// Base pacing delay limited to `[0, MAX_BASE_DELAY_SECS]`
    pub fn base_delay(&self) -> f64 {
        if self.base_delay_secs.is_finite() {
            self.base_delay_secs.clamp(0.0, constants::MAX_BASE_DELAY_SECS)
        } else {
            constants::DEFAULT_BASE_DELAY_SECS
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// No pauses at all; used by tests and dry runs
    pub fn immediate() -> Self {
        Self {
            base_delay_secs: 0.0,
            cooldown_min_secs: 0,
            cooldown_max_secs: 0,
            captcha_timeout_secs: Some(0),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cooldown_window() {
        let config = GuardConfig::default();
        let (lo, hi) = config.cooldown_window();
        assert_eq!(lo, Duration::from_secs(300));
        assert_eq!(hi, Duration::from_secs(600));
    }

    #[test]
    fn test_inverted_window_is_normalized() {
        let config = GuardConfig {
            cooldown_min_secs: 20,
            cooldown_max_secs: 10,
            ..Default::default()
        };
        let (lo, hi) = config.cooldown_window();
        assert!(lo <= hi);
        assert_eq!(lo, Duration::from_secs(10));
    }

    #[test]
    fn test_immediate_has_no_pauses() {
        let config = GuardConfig::immediate();
        assert_eq!(config.base_delay_secs, 0.0);
        assert_eq!(config.cooldown_window(), (Duration::ZERO, Duration::ZERO));
        assert_eq!(config.captcha_timeout(), Some(Duration::ZERO));
    }

    #[test]
    fn test_huge_waits_are_capped() {
        let config = GuardConfig {
            cooldown_min_secs: u64::MAX,
            cooldown_max_secs: u64::MAX,
            captcha_timeout_secs: Some(u64::MAX),
            base_delay_secs: 1e300,
            ..Default::default()
        };
        let cap = Duration::from_secs(constants::MAX_WAIT_SECS);
        assert_eq!(config.cooldown_window(), (cap, cap));
        assert_eq!(config.captcha_timeout(), Some(cap));
        assert_eq!(config.base_delay(), constants::MAX_BASE_DELAY_SECS);
    }

    #[test]
    fn test_non_finite_base_delay_falls_back() {
        let config = GuardConfig {
            base_delay_secs: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.base_delay(), constants::DEFAULT_BASE_DELAY_SECS);
    }
}
