//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every default can be overridden through a `GUARD_*` environment variable.

use std::path::PathBuf;

/// Default ledger database file name
pub const DEFAULT_DB_FILE: &str = "detection_ledger.db";

/// Application data directory name
pub const APP_DIR: &str = "risk-guard";

/// Base pacing delay (seconds)
pub const DEFAULT_BASE_DELAY_SECS: f64 = 2.0;

/// Upper bound accepted for the base pacing delay (seconds)
pub const MAX_BASE_DELAY_SECS: f64 = 3600.0;

/// Upper bound accepted for any configured wait: cooldown, captcha (seconds)
pub const MAX_WAIT_SECS: u64 = 7 * 24 * 3600;

/// Cooldown pause window lower bound (seconds)
pub const DEFAULT_COOLDOWN_MIN_SECS: u64 = 300;

/// Cooldown pause window upper bound (seconds)
pub const DEFAULT_COOLDOWN_MAX_SECS: u64 = 600;

/// How long a session waits for a manual captcha resolution (seconds)
pub const DEFAULT_CAPTCHA_TIMEOUT_SECS: u64 = 900;

/// IP echo endpoint used to find the current egress address
pub const DEFAULT_LOOKUP_URL: &str = "https://httpbin.org/ip";

/// Egress address lookup timeout (seconds)
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;

/// Sentinel for an egress address that could not be resolved
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Sentinel for a client signature the driver could not report
pub const UNKNOWN_SIGNATURE: &str = "unknown-client";

/// Default client signature selection strategy
pub const DEFAULT_SIGNATURE_STRATEGY: &str = "least_used";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get ledger database path from environment or use the app data directory
pub fn get_db_path() -> PathBuf {
    std::env::var("GUARD_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join(DEFAULT_DB_FILE)
        })
}

/// Get egress configuration file, if one is configured
pub fn get_egress_file() -> Option<PathBuf> {
    std::env::var("GUARD_EGRESS_FILE").ok().map(PathBuf::from)
}

/// Get base pacing delay from environment or use default
pub fn get_base_delay_secs() -> f64 {
    std::env::var("GUARD_BASE_DELAY_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|v: &f64| v.is_finite() && *v >= 0.0)
        .map(|v| v.min(MAX_BASE_DELAY_SECS))
        .unwrap_or(DEFAULT_BASE_DELAY_SECS)
}

/// Get cooldown window lower bound from environment or use default
pub fn get_cooldown_min_secs() -> u64 {
    std::env::var("GUARD_COOLDOWN_MIN_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(|v: u64| v.min(MAX_WAIT_SECS))
        .unwrap_or(DEFAULT_COOLDOWN_MIN_SECS)
}

/// Get cooldown window upper bound from environment or use default
pub fn get_cooldown_max_secs() -> u64 {
    std::env::var("GUARD_COOLDOWN_MAX_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(|v: u64| v.min(MAX_WAIT_SECS))
        .unwrap_or(DEFAULT_COOLDOWN_MAX_SECS)
}

/// Get captcha wait timeout from environment or use default.
/// `0` disables the timeout.
pub fn get_captcha_timeout_secs() -> u64 {
    std::env::var("GUARD_CAPTCHA_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(|v: u64| v.min(MAX_WAIT_SECS))
        .unwrap_or(DEFAULT_CAPTCHA_TIMEOUT_SECS)
}

/// Get client signature pool file, if one is configured
pub fn get_signature_file() -> Option<PathBuf> {
    std::env::var("GUARD_SIGNATURE_FILE").ok().map(PathBuf::from)
}

/// Get client signature selection strategy (`least_used` or `random`)
pub fn get_signature_strategy() -> String {
    std::env::var("GUARD_SIGNATURE_STRATEGY")
        .unwrap_or_else(|_| DEFAULT_SIGNATURE_STRATEGY.to_string())
}

/// Get egress lookup endpoint from environment or use default
pub fn get_lookup_url() -> String {
    std::env::var("GUARD_LOOKUP_URL")
        .unwrap_or_else(|_| DEFAULT_LOOKUP_URL.to_string())
}

/// Get egress lookup timeout from environment or use default
pub fn get_lookup_timeout_secs() -> u64 {
    std::env::var("GUARD_LOOKUP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_SECS)
}
