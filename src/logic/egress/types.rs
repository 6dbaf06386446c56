//! Egress Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Initial and maximum success rate
pub const MAX_SUCCESS_RATE: f64 = 1.0;
/// Floor that keeps every record selectable
pub const MIN_SUCCESS_RATE: f64 = 0.1;
pub const SUCCESS_STEP: f64 = 0.1;
pub const FAILURE_STEP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EgressClass {
    Residential,
    Datacenter,
}

impl EgressClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EgressClass::Residential => "residential",
            EgressClass::Datacenter => "datacenter",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Short stable fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.username.as_bytes());
        hasher.update(b":");
        hasher.update(self.password.as_bytes());
        hex::encode(&hasher.finalize()[..4])
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One configured egress point, as read from the egress file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EgressConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "type", alias = "class")]
    pub class: EgressClass,
}

/// Egress point plus its health statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressRecord {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing, default)]
    pub credentials: Credentials,
    pub class: EgressClass,
    /// Within [0.1, 1.0]
    pub success_rate: f64,
    pub failure_streak: u32,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl EgressRecord {
    pub fn new(host: impl Into<String>, port: u16, class: EgressClass, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port,
            credentials,
            class,
            success_rate: MAX_SUCCESS_RATE,
            failure_streak: 0,
            last_used_at: None,
        }
    }

    /// Registry identity
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_residential(&self) -> bool {
        self.class == EgressClass::Residential
    }

    pub(crate) fn apply_outcome(&mut self, success: bool, now: DateTime<Utc>) {
        if success {
            self.failure_streak = self.failure_streak.saturating_sub(1);
            self.success_rate = (self.success_rate + SUCCESS_STEP).min(MAX_SUCCESS_RATE);
        } else {
            self.failure_streak += 1;
            self.success_rate = (self.success_rate - FAILURE_STEP).max(MIN_SUCCESS_RATE);
        }
        self.last_used_at = Some(now);
    }
}

impl From<EgressConfig> for EgressRecord {
    fn from(config: EgressConfig) -> Self {
        EgressRecord::new(
            config.host,
            config.port,
            config.class,
            Credentials {
                username: config.username,
                password: config.password,
            },
        )
    }
}

impl std::fmt::Display for EgressRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, cred {}, rate {:.2})",
            self.key(),
            self.class.as_str(),
            self.credentials.fingerprint(),
            self.success_rate
        )
    }
}
