//! Egress Health Registry
//!
//! Shared across sessions. All reads and read-modify-write sequences run
//! under one exclusive lock.

use std::path::Path;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::types::{EgressConfig, EgressRecord};
use crate::logic::error::ConfigError;

#[derive(Default)]
pub struct EgressRegistry {
    records: Mutex<Vec<EgressRecord>>,
}

impl EgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<EgressRecord>) -> Self {
        Self { records: Mutex::new(records) }
    }

    /// Build a registry from a JSON array of egress configs
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let configs: Vec<EgressConfig> = serde_json::from_str(&raw)?;

        let registry = Self::new();
        for config in configs {
            registry.add(config.into());
        }
        log::info!("Loaded {} egress records from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Startup-time append. Duplicate keys are ignored.
    pub fn add(&self, record: EgressRecord) {
        let mut records = self.records.lock();
        if records.iter().any(|r| r.key() == record.key()) {
            log::warn!("Duplicate egress record {} ignored", record.key());
            return;
        }
        records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Highest success rate, with residential records always preferred
    pub fn select_best(&self) -> Option<EgressRecord> {
        let records = self.records.lock();
        if records.is_empty() {
            return None;
        }

        // stable: ties keep configuration order
        let mut ranked: Vec<&EgressRecord> = records.iter().collect();
        ranked.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));

        ranked
            .iter()
            .find(|r| r.is_residential())
            .or_else(|| ranked.first())
            .map(|r| (*r).clone())
    }

    /// Fold one outcome into the record identified by `key`.
    /// Returns false when no such record exists.
    pub fn report_outcome(&self, key: &str, success: bool) -> bool {
        self.report_outcome_at(key, success, Utc::now())
    }

    pub fn report_outcome_at(&self, key: &str, success: bool, now: DateTime<Utc>) -> bool {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.key() == key) {
            Some(record) => {
                record.apply_outcome(success, now);
                log::debug!(
                    "Egress {} {}: rate {:.2}, failure streak {}",
                    key,
                    if success { "ok" } else { "failed" },
                    record.success_rate,
                    record.failure_streak
                );
                true
            }
            None => {
                log::warn!("Outcome reported for unknown egress {}", key);
                false
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<EgressRecord> {
        self.records.lock().iter().find(|r| r.key() == key).cloned()
    }

    /// Copy of every record, in configuration order
    pub fn snapshot(&self) -> Vec<EgressRecord> {
        self.records.lock().clone()
    }
}

// ============================================================================
// TESTS
// ============================================================================
