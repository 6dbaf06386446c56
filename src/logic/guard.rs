//! Guard Facade
//!
//! Front-end surface over the shared components. Holds the ledger, the
//! egress registry, the pacing table and the captcha gate, and builds one
//! orchestrator per running session.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;

use super::config::GuardConfig;
use super::countermeasure::{ManualCaptchaGate, Orchestrator, SessionDeps, SessionDriver};
use super::egress::{ClientSignaturePool, EgressRecord, EgressRegistry};
use super::error::{GuardError, PersistenceError};
use super::ledger::{DetectionEvent, Ledger};
use super::lookup::{AddressLookup, HttpAddressLookup};
use super::pacing::{DelayState, PacingTable};
use super::risk::{RiskScorer, SessionRiskState};

pub struct Guard {
    ledger: Arc<Ledger>,
    scorer: RiskScorer,
    registry: Arc<EgressRegistry>,
    signatures: Arc<ClientSignaturePool>,
    pacing: Arc<PacingTable>,
    captcha: Arc<ManualCaptchaGate>,
    lookup: Arc<dyn AddressLookup>,
    config: GuardConfig,
}

impl Guard {
    /// Open the ledger and load egress points named by `config`
    pub fn open(config: GuardConfig) -> Result<Self, GuardError> {
        let ledger = Ledger::open(&config.db_path)?;
        let registry = match &config.egress_file {
            Some(path) => EgressRegistry::load_from_file(path)?,
            None => {
                log::info!("No egress file configured, running without egress rotation");
                EgressRegistry::new()
            }
        };
        let signatures = match &config.signature_file {
            Some(path) => ClientSignaturePool::load_from_file(path, config.signature_strategy)?,
            None => ClientSignaturePool::default(),
        };
        let lookup = HttpAddressLookup::new(config.lookup_url.clone(), config.lookup_timeout());

        log::info!(
            "Guard ready: ledger {}, {} egress point(s), {} client signature(s)",
            config.db_path.display(),
            registry.len(),
            signatures.len()
        );
        let guard = Self::from_parts(config, Arc::new(ledger), Arc::new(registry), Arc::new(lookup));
        Ok(guard.with_signatures(signatures))
    }

    pub fn from_parts(
        config: GuardConfig,
        ledger: Arc<Ledger>,
        registry: Arc<EgressRegistry>,
        lookup: Arc<dyn AddressLookup>,
    ) -> Self {
        Self {
            scorer: RiskScorer::new(Arc::clone(&ledger)),
            pacing: Arc::new(PacingTable::new(config.base_delay())),
            captcha: Arc::new(ManualCaptchaGate::new()),
            signatures: Arc::new(ClientSignaturePool::default()),
            ledger,
            registry,
            lookup,
            config,
        }
    }

    /// Client signatures handed out on egress rotation
    pub fn with_signatures(mut self, signatures: ClientSignaturePool) -> Self {
        self.signatures = Arc::new(signatures);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    pub fn registry(&self) -> Arc<EgressRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn signatures(&self) -> Arc<ClientSignaturePool> {
        Arc::clone(&self.signatures)
    }

    // ==================== Ledger & Risk ====================

    pub fn record_event(&self, event: &DetectionEvent) -> Result<(), PersistenceError> {
        self.ledger.append(event)
    }

    pub fn risk_score(&self, session_id: &str) -> Result<f64, PersistenceError> {
        self.scorer.score(session_id, Utc::now())
    }

    pub fn should_escalate(&self, session_id: &str) -> Result<bool, PersistenceError> {
        self.scorer.should_escalate(session_id, Utc::now())
    }

    pub fn session_risk(&self, session_id: &str) -> Result<SessionRiskState, PersistenceError> {
        self.scorer.session_risk(session_id, Utc::now())
    }

    // ==================== Egress ====================

    pub fn best_egress(&self) -> Option<EgressRecord> {
        self.registry.select_best()
    }

    /// False when no record has that `host:port` key
    pub fn report_egress_outcome(&self, key: &str, success: bool) -> bool {
        self.registry.report_outcome(key, success)
    }

    // ==================== Pacing ====================

    pub fn next_delay(&self, session_id: &str) -> Duration {
        self.pacing.next_delay(session_id)
    }

    pub fn report_delay_outcome(&self, session_id: &str, success: bool) {
        self.pacing.report_outcome(session_id, success)
    }

    pub fn delay_state(&self, session_id: &str) -> Option<DelayState> {
        self.pacing.state(session_id)
    }

    // ==================== Captcha ====================

    /// Release a session waiting on a captcha. False when none is waiting.
    pub fn resolve_captcha(&self, session_id: &str) -> bool {
        self.captcha.resolve(session_id)
    }

    pub fn pending_captchas(&self) -> Vec<String> {
        self.captcha.pending()
    }

    // ==================== Sessions ====================

    /// Orchestrator for `session_id`, sharing this guard's pacing controller
    /// for that session. The driver starts on the current best egress.
    pub fn orchestrator<D: SessionDriver>(&self, session_id: &str, driver: D) -> Orchestrator<D> {
        let deps = SessionDeps {
            ledger: Arc::clone(&self.ledger),
            registry: Arc::clone(&self.registry),
            signatures: Arc::clone(&self.signatures),
            pacing: self.pacing.controller(session_id),
            captcha: self.captcha.clone(),
            lookup: Arc::clone(&self.lookup),
            config: self.config.clone(),
        };
        let orchestrator = Orchestrator::new(session_id, driver, deps);
        match self.registry.select_best() {
            Some(egress) => orchestrator.with_egress(egress),
            None => orchestrator,
        }
    }

    /// Drop per-session pacing state once a session ends
    pub fn end_session(&self, session_id: &str) -> bool {
        self.pacing.remove(session_id)
    }
}
