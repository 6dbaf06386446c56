//! Manual Captcha Resolution
//!
//! A captcha is a hard stop. The session waits until an operator marks it
//! resolved, the configured timeout passes, or the session is cancelled.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use super::cancel::CancelToken;

/// Re-check interval for cancellation while waiting
const CANCEL_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptchaResolution {
    Resolved,
    TimedOut,
    Cancelled,
}

pub trait CaptchaResolver: Send + Sync {
    fn await_resolution(
        &self,
        session_id: &str,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> CaptchaResolution;
}

// ============================================================================
// MANUAL GATE
// ============================================================================

#[derive(Default)]
struct GateState {
    pending: HashSet<String>,
    resolved: HashSet<String>,
}

/// Shared gate: sessions park here, an operator releases them
#[derive(Default)]
pub struct ManualCaptchaGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl ManualCaptchaGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the captcha of `session_id` solved. False when nothing is waiting.
    pub fn resolve(&self, session_id: &str) -> bool {
        let mut state = self.state.lock();
        if !state.pending.contains(session_id) {
            return false;
        }
        state.resolved.insert(session_id.to_string());
        self.cond.notify_all();
        log::info!("Captcha for session {} marked resolved", session_id);
        true
    }

    /// Sessions currently waiting for an operator
    pub fn pending(&self) -> Vec<String> {
        let mut sessions: Vec<String> = self.state.lock().pending.iter().cloned().collect();
        sessions.sort();
        sessions
    }
}

impl CaptchaResolver for ManualCaptchaGate {
    fn await_resolution(
        &self,
        session_id: &str,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> CaptchaResolution {
        // a timeout too large to form a deadline waits without one
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.state.lock();
        state.pending.insert(session_id.to_string());
        state.resolved.remove(session_id);

        let resolution = loop {
            if state.resolved.remove(session_id) {
                break CaptchaResolution::Resolved;
            }
            if cancel.is_cancelled() {
                break CaptchaResolution::Cancelled;
            }

            let now = Instant::now();
            let wake = match deadline {
                Some(d) if now >= d => break CaptchaResolution::TimedOut,
                Some(d) => d.min(now + CANCEL_POLL),
                None => now + CANCEL_POLL,
            };
            self.cond.wait_until(&mut state, wake);
        };

        state.pending.remove(session_id);
        resolution
    }
}
