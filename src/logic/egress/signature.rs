//! Client Signature Pool
//!
//! Operator-supplied client signatures handed to the driver when a session
//! is restarted on a new egress point. Usage is counted per signature so
//! rotation spreads evenly.

use std::path::Path;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::logic::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Fewest picks so far, ties broken at random
    LeastUsed,
    /// Uniform pick
    Random,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::LeastUsed => "least_used",
            SelectionStrategy::Random => "random",
        }
    }

    /// Unknown names fall back to `LeastUsed`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => SelectionStrategy::Random,
            "least_used" | "least-used" => SelectionStrategy::LeastUsed,
            other => {
                log::warn!("Unknown signature strategy '{}', using least_used", other);
                SelectionStrategy::LeastUsed
            }
        }
    }
}

struct PoolState {
    entries: Vec<(String, u64)>,
    rng: StdRng,
}

pub struct ClientSignaturePool {
    strategy: SelectionStrategy,
    state: Mutex<PoolState>,
}

impl Default for ClientSignaturePool {
    fn default() -> Self {
        Self::new(Vec::new(), SelectionStrategy::LeastUsed)
    }
}

impl ClientSignaturePool {
    pub fn new(signatures: Vec<String>, strategy: SelectionStrategy) -> Self {
        Self::with_rng(signatures, strategy, StdRng::from_entropy())
    }

    /// Deterministic tie-breaking (for testing)
    pub fn with_seed(signatures: Vec<String>, strategy: SelectionStrategy, seed: u64) -> Self {
        Self::with_rng(signatures, strategy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(signatures: Vec<String>, strategy: SelectionStrategy, rng: StdRng) -> Self {
        let mut entries: Vec<(String, u64)> = Vec::with_capacity(signatures.len());
        for signature in signatures {
            let signature = signature.trim().to_string();
            if signature.is_empty() || entries.iter().any(|(s, _)| *s == signature) {
                continue;
            }
            entries.push((signature, 0));
        }
        Self {
            strategy,
            state: Mutex::new(PoolState { entries, rng }),
        }
    }

    /// Pool from a JSON array of strings
    pub fn load_from_file<P: AsRef<Path>>(path: P, strategy: SelectionStrategy) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let signatures: Vec<String> = serde_json::from_str(&raw)?;

        let pool = Self::new(signatures, strategy);
        log::info!(
            "Loaded {} client signatures from {} ({})",
            pool.len(),
            path.display(),
            strategy.as_str()
        );
        Ok(pool)
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Next signature per the pool strategy; `None` for an empty pool
    pub fn pick(&self) -> Option<String> {
        let mut state = self.state.lock();
        let PoolState { entries, rng } = &mut *state;

        let min_usage = entries.iter().map(|(_, n)| *n).min()?;
        let candidates: Vec<usize> = match self.strategy {
            SelectionStrategy::LeastUsed => entries
                .iter()
                .enumerate()
                .filter(|(_, (_, n))| *n == min_usage)
                .map(|(i, _)| i)
                .collect(),
            SelectionStrategy::Random => (0..entries.len()).collect(),
        };

        let index = *candidates.choose(rng)?;
        let entry = &mut entries[index];
        entry.1 += 1;
        Some(entry.0.clone())
    }

    /// Times `signature` has been picked
    pub fn usage(&self, signature: &str) -> Option<u64> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|(s, _)| s == signature)
            .map(|(_, n)| *n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn pool(strategy: SelectionStrategy) -> ClientSignaturePool {
        let signatures = vec!["client-a".to_string(), "client-b".to_string(), "client-c".to_string()];
        ClientSignaturePool::with_seed(signatures, strategy, 42)
    }

    #[test]
    fn test_empty_pool_picks_nothing() {
        assert_eq!(ClientSignaturePool::default().pick(), None);
    }

    #[test]
    fn test_least_used_cycles_through_all() {
        let pool = pool(SelectionStrategy::LeastUsed);
        let first_round: HashSet<String> = (0..3).filter_map(|_| pool.pick()).collect();
        assert_eq!(first_round.len(), 3);

        for _ in 0..3 {
            pool.pick();
        }
        for signature in ["client-a", "client-b", "client-c"] {
            assert_eq!(pool.usage(signature), Some(2));
        }
    }

    #[test]
    fn test_random_stays_in_pool() {
        let pool = pool(SelectionStrategy::Random);
        for _ in 0..50 {
            let picked = pool.pick().unwrap();
            assert!(pool.usage(&picked).is_some());
        }
    }

    #[test]
    fn test_blank_and_duplicate_entries_dropped() {
        let pool = ClientSignaturePool::new(
            vec!["x".to_string(), " ".to_string(), "x".to_string()],
            SelectionStrategy::LeastUsed,
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(SelectionStrategy::parse("Random"), SelectionStrategy::Random);
        assert_eq!(SelectionStrategy::parse("least_used"), SelectionStrategy::LeastUsed);
        assert_eq!(SelectionStrategy::parse("round-robin"), SelectionStrategy::LeastUsed);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["client-a", "client-b"]"#).unwrap();

        let pool = ClientSignaturePool::load_from_file(file.path(), SelectionStrategy::Random).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.strategy(), SelectionStrategy::Random);
    }

    #[test]
    fn test_load_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ua": "x"}}"#).unwrap();
        assert!(matches!(
            ClientSignaturePool::load_from_file(file.path(), SelectionStrategy::LeastUsed),
            Err(ConfigError::Parse(_))
        ));
    }
}
