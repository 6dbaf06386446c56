//! Countermeasure Orchestrator
//!
//! Per-session state machine: ACTIVE -> HANDLING(kind) -> COOLDOWN -> ACTIVE.
//! The only component that drives side effects on the driver.
//!
//! ## Pipeline
//! probe -> (positive) classify -> record -> captcha stop / block cooldown
//!       -> score re-check -> (escalate) cooldown
//! probe -> (negative) pace -> execute -> report -> record success or handle

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::behavior::Behavior;
use super::cancel::CancelToken;
use super::captcha::{CaptchaResolution, CaptchaResolver};
use super::classify::classify_content;
use super::driver::{ActionRequest, SessionDriver, PROBE_ORDER};
use super::types::{ActionOutcome, HandlingReport, OrchestratorState, StateChange, Trigger};
use crate::constants::UNKNOWN_SIGNATURE;
use crate::logic::config::GuardConfig;
use crate::logic::egress::{ClientSignaturePool, EgressRecord, EgressRegistry};
use crate::logic::error::{DriverError, OrchestratorError};
use crate::logic::ledger::{DetectionEvent, DetectionKind, Ledger};
use crate::logic::lookup::AddressLookup;
use crate::logic::pacing::SharedDelay;
use crate::logic::risk::RiskScorer;

/// Transitions kept for inspection
const MAX_HISTORY: usize = 64;

/// Shared collaborators a session needs
#[derive(Clone)]
pub struct SessionDeps {
    pub ledger: Arc<Ledger>,
    pub registry: Arc<EgressRegistry>,
    pub signatures: Arc<ClientSignaturePool>,
    pub pacing: SharedDelay,
    pub captcha: Arc<dyn CaptchaResolver>,
    pub lookup: Arc<dyn AddressLookup>,
    pub config: GuardConfig,
}

pub struct Orchestrator<D: SessionDriver> {
    session_id: String,
    driver: D,
    ledger: Arc<Ledger>,
    scorer: RiskScorer,
    registry: Arc<EgressRegistry>,
    signatures: Arc<ClientSignaturePool>,
    pacing: SharedDelay,
    captcha: Arc<dyn CaptchaResolver>,
    lookup: Arc<dyn AddressLookup>,
    config: GuardConfig,
    cancel: CancelToken,
    current_egress: Option<EgressRecord>,
    state: OrchestratorState,
    history: Vec<StateChange>,
    rng: StdRng,
}

impl<D: SessionDriver> Orchestrator<D> {
    pub fn new(session_id: impl Into<String>, driver: D, deps: SessionDeps) -> Self {
        Self {
            session_id: session_id.into(),
            driver,
            scorer: RiskScorer::new(Arc::clone(&deps.ledger)),
            ledger: deps.ledger,
            registry: deps.registry,
            signatures: deps.signatures,
            pacing: deps.pacing,
            captcha: deps.captcha,
            lookup: deps.lookup,
            config: deps.config,
            cancel: CancelToken::new(),
            current_egress: None,
            state: OrchestratorState::Active,
            history: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Egress the driver was started with
    pub fn with_egress(mut self, egress: EgressRecord) -> Self {
        self.current_egress = Some(egress);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ==================== Accessors ====================

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn history(&self) -> &[StateChange] {
        &self.history
    }

    pub fn current_egress(&self) -> Option<&EgressRecord> {
        self.current_egress.as_ref()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Session teardown
    pub fn into_driver(self) -> D {
        self.driver
    }

    // ==================== Action Path ====================

    /// Run one action through probe, pacing and detection handling
    pub fn perform(&mut self, action: &ActionRequest) -> Result<ActionOutcome, OrchestratorError> {
        if self.probe_for_detection_indicators()? {
            let report = self.handle_detection(Trigger::Probe)?;
            return Ok(ActionOutcome::Handled(report));
        }

        let delay = self.pacing.lock().next_delay();
        self.pause(delay)?;

        let success = match self.driver.execute_action(action) {
            Ok(done) => done,
            Err(e) => {
                log::error!("Session {}: {} raised: {}", self.session_id, action.description(), e);
                false
            }
        };

        self.pacing.lock().report_outcome(success);
        if let Some(egress) = &self.current_egress {
            self.registry.report_outcome(&egress.key(), success);
        }

        if success {
            let details = format!("Action: {}", action.action_type());
            self.record(DetectionKind::Success, details)?;
            return Ok(ActionOutcome::Completed);
        }

        log::warn!("Session {}: {} failed", self.session_id, action.description());
        let report = self.handle_detection(Trigger::ActionFailed)?;
        Ok(ActionOutcome::Handled(report))
    }

    /// Scan indicators in order. Only per-indicator probe errors are ignored.
    pub fn probe_for_detection_indicators(&mut self) -> Result<bool, DriverError> {
        for indicator in PROBE_ORDER {
            match self.driver.try_indicator(indicator) {
                Ok(true) => {
                    log::warn!("Session {}: detection indicator {} present", self.session_id, indicator);
                    return Ok(true);
                }
                Ok(false) => {}
                Err(DriverError::Probe(e)) => {
                    log::debug!("Session {}: {}", self.session_id, e);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(false)
    }

    /// Run 1-2 weighted random behaviors. Driver hiccups are ignored.
    pub fn simulate_activity(&mut self) -> Result<Vec<Behavior>, OrchestratorError> {
        let count = self.rng.gen_range(1..=2);
        let mut performed = Vec::with_capacity(count);

        for _ in 0..count {
            let behavior = Behavior::draw(&mut self.rng);
            match behavior.perform(&mut self.driver, &mut self.rng, self.config.base_delay()) {
                Ok(pause) => {
                    self.pause(pause)?;
                    performed.push(behavior);
                }
                Err(e) => log::debug!("Session {}: behavior {} skipped: {}", self.session_id, behavior.as_str(), e),
            }
        }
        Ok(performed)
    }

    // ==================== Handling ====================

    fn handle_detection(&mut self, trigger: Trigger) -> Result<HandlingReport, OrchestratorError> {
        let kind = self.classify_detection();
        self.transition(OrchestratorState::Handling(kind));
        self.record(kind, format!("Detection handling triggered by {}", trigger.as_str()))?;

        let mut report = HandlingReport {
            trigger,
            kind,
            captcha: None,
            cooldowns: 0,
        };

        match kind {
            DetectionKind::Captcha => {
                log::warn!("Session {}: captcha detected - manual resolution required", self.session_id);
                let resolution = self.captcha.await_resolution(
                    &self.session_id,
                    self.config.captcha_timeout(),
                    &self.cancel,
                );
                report.captcha = Some(resolution);
                match resolution {
                    CaptchaResolution::Resolved => {
                        log::info!("Session {}: captcha resolved", self.session_id);
                    }
                    CaptchaResolution::TimedOut => {
                        log::warn!("Session {}: captcha not resolved in time, escalating", self.session_id);
                        self.enter_cooldown()?;
                        report.cooldowns += 1;
                    }
                    CaptchaResolution::Cancelled => return Err(self.cancelled()),
                }
            }
            DetectionKind::Block => {
                log::warn!("Session {}: block detected", self.session_id);
                self.enter_cooldown()?;
                report.cooldowns += 1;
            }
            DetectionKind::Suspicious | DetectionKind::Success => {}
        }

        // independent of the block path above
        if self.scorer.should_escalate(&self.session_id, Utc::now())? {
            log::warn!("Session {}: risk score above threshold", self.session_id);
            self.enter_cooldown()?;
            report.cooldowns += 1;
        }

        self.transition(OrchestratorState::Active);
        Ok(report)
    }

    /// Unreadable page content counts as suspicious
    fn classify_detection(&mut self) -> DetectionKind {
        match self.driver.page_content() {
            Ok(content) => classify_content(&content),
            Err(e) => {
                log::debug!("Session {}: page content unavailable: {}", self.session_id, e);
                DetectionKind::Suspicious
            }
        }
    }

    fn enter_cooldown(&mut self) -> Result<(), OrchestratorError> {
        self.transition(OrchestratorState::Cooldown);
        self.rotate_egress();
        self.pacing.lock().escalate();

        let pause = self.draw_cooldown();
        log::warn!("Session {}: cooling down for {}s", self.session_id, pause.as_secs());
        self.pause(pause)?;

        self.transition(OrchestratorState::Active);
        Ok(())
    }

    fn rotate_egress(&mut self) {
        let Some(best) = self.registry.select_best() else {
            return;
        };
        let unchanged = self
            .current_egress
            .as_ref()
            .is_some_and(|current| current.key() == best.key());
        if unchanged {
            return;
        }

        let signature = self.signatures.pick();
        match self.driver.reinitialize_with_egress(&best, signature.as_deref()) {
            Ok(()) => {
                log::info!("Session {}: switched egress to {}", self.session_id, best);
                if let Some(signature) = &signature {
                    log::debug!("Session {}: client signature {}", self.session_id, signature);
                }
                self.current_egress = Some(best);
            }
            Err(e) => {
                log::error!("Session {}: egress switch to {} failed: {}", self.session_id, best.key(), e);
            }
        }
    }

    fn draw_cooldown(&mut self) -> Duration {
        let (lo, hi) = self.config.cooldown_window();
        self.rng.gen_range(lo..=hi)
    }

    // ==================== Helpers ====================

    fn record(&mut self, kind: DetectionKind, details: String) -> Result<(), OrchestratorError> {
        let signature = self.driver.client_signature().unwrap_or_else(|e| {
            log::debug!("Session {}: client signature unavailable: {}", self.session_id, e);
            UNKNOWN_SIGNATURE.to_string()
        });
        let event = DetectionEvent::new(
            kind,
            self.session_id.as_str(),
            self.lookup.current_address(),
            signature,
            details,
        );
        self.ledger.append(&event)?;
        Ok(())
    }

    fn pause(&mut self, duration: Duration) -> Result<(), OrchestratorError> {
        if self.cancel.sleep(duration).is_err() {
            return Err(self.cancelled());
        }
        Ok(())
    }

    /// Cancellation leaves the session ACTIVE
    fn cancelled(&mut self) -> OrchestratorError {
        log::info!("Session {}: cancelled in {}", self.session_id, self.state);
        self.transition(OrchestratorState::Active);
        OrchestratorError::Cancelled(self.session_id.clone())
    }

    fn transition(&mut self, to: OrchestratorState) {
        if self.state == to {
            return;
        }
        log::info!("Session {}: {} -> {}", self.session_id, self.state, to);
        self.history.push(StateChange {
            from: self.state,
            to,
            at: Utc::now(),
        });
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
        self.state = to;
    }
}
