//! Per-session pacing table
//!
//! Hands out one delay controller per session. The orchestrator of a
//! session and the front-end facade share the same controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::{Mutex, RwLock};

use super::delay::{DelayController, DelayState};

pub type SharedDelay = Arc<Mutex<DelayController>>;

pub struct PacingTable {
    base_delay_secs: f64,
    sessions: RwLock<HashMap<String, SharedDelay>>,
}

impl PacingTable {
    pub fn new(base_delay_secs: f64) -> Self {
        Self {
            base_delay_secs,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Controller for `session_id`, created on first use
    pub fn controller(&self, session_id: &str) -> SharedDelay {
        if let Some(existing) = self.sessions.read().get(session_id) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(DelayController::new(self.base_delay_secs))));
        Arc::clone(entry)
    }

    pub fn next_delay(&self, session_id: &str) -> Duration {
        self.controller(session_id).lock().next_delay()
    }

    pub fn report_outcome(&self, session_id: &str, success: bool) {
        self.controller(session_id).lock().report_outcome(success);
    }

    pub fn state(&self, session_id: &str) -> Option<DelayState> {
        self.sessions.read().get(session_id).map(|c| c.lock().state())
    }

    /// Drop a torn-down session
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_session_shares_controller() {
        let table = PacingTable::new(2.0);
        let a = table.controller("s1");
        let b = table.controller("s1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let table = PacingTable::new(2.0);
        for _ in 0..4 {
            table.report_outcome("noisy", false);
        }
        table.next_delay("noisy");
        table.next_delay("quiet");

        assert!(table.state("noisy").unwrap().multiplier > 1.0);
        assert_eq!(table.state("quiet").unwrap().multiplier, 1.0);
    }

    #[test]
    fn test_remove_session() {
        let table = PacingTable::new(2.0);
        table.controller("s1");
        assert!(table.remove("s1"));
        assert!(table.state("s1").is_none());
        assert!(table.is_empty());
    }
}
