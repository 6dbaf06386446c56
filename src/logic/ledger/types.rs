//! Ledger Types
//!
//! Data structures only. No persistence logic here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// DETECTION KIND
// ============================================================================

/// Classified outcome observed for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    /// Challenge page awaiting a human
    Captcha,
    /// Access refused (blocked notice, 403, 429)
    Block,
    /// Anything else that looks like detection
    Suspicious,
    /// Action completed normally
    Success,
}

impl DetectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionKind::Captcha => "captcha",
            DetectionKind::Block => "block",
            DetectionKind::Suspicious => "suspicious",
            DetectionKind::Success => "success",
        }
    }

    /// Parse the stored column value. Unknown strings yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "captcha" => Some(DetectionKind::Captcha),
            "block" => Some(DetectionKind::Block),
            "suspicious" => Some(DetectionKind::Suspicious),
            "success" => Some(DetectionKind::Success),
            _ => None,
        }
    }

    pub fn is_detection(&self) -> bool {
        !matches!(self, DetectionKind::Success)
    }
}

impl std::fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DETECTION EVENT
// ============================================================================

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: DetectionKind,
    pub source_address: String,
    /// Client signature in use, e.g. the user agent
    pub client_signature: String,
    pub session_id: String,
    pub details: String,
}

impl DetectionEvent {
    pub fn new(
        kind: DetectionKind,
        session_id: impl Into<String>,
        source_address: impl Into<String>,
        client_signature: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            source_address: source_address.into(),
            client_signature: client_signature.into(),
            session_id: session_id.into(),
            details: details.into(),
        }
    }

    /// Same event, stamped at `timestamp`
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// ============================================================================
// SESSION HEALTH (cached row)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Flagged,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Flagged => "flagged",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value == "flagged" {
            SessionStatus::Flagged
        } else {
            SessionStatus::Active
        }
    }
}

/// Row of `session_health`. Refreshed by every risk score computation;
/// the event ledger stays authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHealthRecord {
    pub session_id: String,
    pub last_success: Option<DateTime<Utc>>,
    /// Detection events inside the scoring window
    pub failure_count: u32,
    pub risk_score: f64,
    pub status: SessionStatus,
}
