//! Error Types
//!
//! One enum per failure concern. Only `PersistenceError` and driver loss
//! ever leave a session; the rest are absorbed where they occur.

use thiserror::Error;

/// Ledger or registry store unreachable
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cannot prepare store at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single detection-indicator check failed
#[derive(Debug, Clone, Error)]
#[error("indicator {indicator} check failed: {message}")]
pub struct ProbeError {
    pub indicator: String,
    pub message: String,
}

/// Action execution threw
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("action {action} failed: {message}")]
    Failed { action: String, message: String },

    #[error("action {action} is not supported by this driver")]
    Unsupported { action: String },
}

/// Egress address lookup failed
#[derive(Debug, Error)]
pub enum NetworkLookupError {
    #[error("lookup request failed: {0}")]
    Request(String),

    #[error("lookup response unreadable: {0}")]
    Parse(String),
}

/// Anything the browser-automation collaborator can report
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("driver disconnected: {0}")]
    Disconnected(String),
}

/// Errors that end one orchestrator call
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("session {0} was cancelled")]
    Cancelled(String),
}

/// Egress configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid egress configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Guard could not be assembled from configuration
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
