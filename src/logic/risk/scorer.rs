//! Risk Scorer
//!
//! Input: ledger window for one session
//! Output: score in [0.0, 10.0]
//!
//! Every call also refreshes the `session_health` row so the cached view
//! never drifts from what was last computed.

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};

use super::rules::{self, ESCALATION_THRESHOLD, MAX_SCORE, MIN_SCORE, SCORING_WINDOW_HOURS};
use super::types::SessionRiskState;
use crate::logic::error::PersistenceError;
use crate::logic::ledger::{DetectionEvent, DetectionKind, Ledger, SessionHealthRecord, SessionStatus};

// ============================================================================
// PURE SCORING
// ============================================================================

/// Weighted, decayed and clamped sum over `events`, evaluated at `now`
pub fn compute_score(events: &[DetectionEvent], now: DateTime<Utc>) -> f64 {
    if events.is_empty() {
        return 0.0;
    }

    let total: f64 = events
        .iter()
        .map(|event| {
            let age_hours = (now - event.timestamp).num_milliseconds() as f64 / 3_600_000.0;
            rules::weight(event.kind) * rules::time_weight(age_hours)
        })
        .sum();

    total.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn status_for(score: f64) -> SessionStatus {
    if score > ESCALATION_THRESHOLD {
        SessionStatus::Flagged
    } else {
        SessionStatus::Active
    }
}

// ============================================================================
// SCORER
// ============================================================================

#[derive(Clone)]
pub struct RiskScorer {
    ledger: Arc<Ledger>,
}

impl RiskScorer {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Current risk score for `session_id` as of `now`. The window read and
    /// the `session_health` refresh are one ledger operation.
    pub fn score(&self, session_id: &str, now: DateTime<Utc>) -> Result<f64, PersistenceError> {
        let since = now - Duration::hours(SCORING_WINDOW_HOURS);
        let (score, count) = self.ledger.update_health(session_id, since, |events, cached| {
            let score = compute_score(events, now);
            let record = health_record(session_id, events, cached, score);
            ((score, events.len()), record)
        })?;

        log::debug!("Risk score for {}: {:.2} ({} events)", session_id, score, count);
        Ok(score)
    }

    /// True iff the score is strictly above the escalation threshold
    pub fn should_escalate(&self, session_id: &str, now: DateTime<Utc>) -> Result<bool, PersistenceError> {
        Ok(self.score(session_id, now)? > ESCALATION_THRESHOLD)
    }

    pub fn session_risk(&self, session_id: &str, now: DateTime<Utc>) -> Result<SessionRiskState, PersistenceError> {
        let risk_score = self.score(session_id, now)?;
        Ok(SessionRiskState {
            session_id: session_id.to_string(),
            risk_score,
            status: status_for(risk_score),
        })
    }
}

/// Cache row for `score`. `last_success` carries over from `cached` when
/// the window holds no success.
fn health_record(
    session_id: &str,
    events: &[DetectionEvent],
    cached: Option<SessionHealthRecord>,
    score: f64,
) -> SessionHealthRecord {
    // events are newest first
    let last_success = events
        .iter()
        .find(|e| e.kind == DetectionKind::Success)
        .map(|e| e.timestamp)
        .or_else(|| cached.and_then(|h| h.last_success));

    SessionHealthRecord {
        session_id: session_id.to_string(),
        last_success,
        failure_count: events.iter().filter(|e| e.kind.is_detection()).count() as u32,
        risk_score: score,
        status: status_for(score),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<Ledger>, RiskScorer) {
        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let scorer = RiskScorer::new(Arc::clone(&ledger));
        (ledger, scorer)
    }

    fn record(ledger: &Ledger, session: &str, kind: DetectionKind, at: DateTime<Utc>) {
        let event = DetectionEvent::new(kind, session, "203.0.113.7", "agent", "test").at(at);
        ledger.append(&event).unwrap();
    }

    #[test]
    fn test_no_events_scores_zero() {
        let (_, scorer) = setup();
        assert_eq!(scorer.score("nobody", Utc::now()).unwrap(), 0.0);
    }

    #[test]
    fn test_events_outside_window_score_zero() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "s1", DetectionKind::Block, now - Duration::hours(30));
        assert_eq!(scorer.score("s1", now).unwrap(), 0.0);
    }

    #[test]
    fn test_recent_block_beats_recent_suspicious() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "a", DetectionKind::Block, now - Duration::minutes(30));
        record(&ledger, "b", DetectionKind::Suspicious, now - Duration::minutes(30));

        assert!(scorer.score("a", now).unwrap() > scorer.score("b", now).unwrap());
    }

    #[test]
    fn test_single_block_outweighs_old_suspicious_events() {
        let now = Utc::now();
        let old: Vec<_> = (0..3)
            .map(|_| {
                DetectionEvent::new(DetectionKind::Suspicious, "s", "x", "y", "")
                    .at(now - Duration::hours(20))
            })
            .collect();
        let fresh = vec![DetectionEvent::new(DetectionKind::Block, "s", "x", "y", "").at(now)];

        assert!(compute_score(&fresh, now) > compute_score(&old, now));
    }

    #[test]
    fn test_block_and_captcha_escalate() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "s1", DetectionKind::Block, now - Duration::minutes(20));
        record(&ledger, "s1", DetectionKind::Captcha, now - Duration::minutes(40));

        assert!(scorer.score("s1", now).unwrap() > 5.0);
        assert!(scorer.should_escalate("s1", now).unwrap());
    }

    #[test]
    fn test_successes_clamp_at_zero() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        for i in 0..10 {
            record(&ledger, "calm", DetectionKind::Success, now - Duration::minutes(6 * i));
        }
        assert_eq!(scorer.score("calm", now).unwrap(), 0.0);
    }

    #[test]
    fn test_score_is_bounded_above() {
        let now = Utc::now();
        let events: Vec<_> = (0..20)
            .map(|_| DetectionEvent::new(DetectionKind::Block, "s", "x", "y", "").at(now))
            .collect();
        assert_eq!(compute_score(&events, now), 10.0);
    }

    #[test]
    fn test_score_bounds_over_mixed_sequences() {
        let now = Utc::now();
        let kinds = [
            DetectionKind::Block,
            DetectionKind::Success,
            DetectionKind::Captcha,
            DetectionKind::Success,
            DetectionKind::Suspicious,
        ];
        let mut events = Vec::new();
        for i in 0..40 {
            let kind = kinds[(i * 7) % kinds.len()];
            events.push(DetectionEvent::new(kind, "s", "x", "y", "").at(now - Duration::minutes(i as i64 * 35)));
            let score = compute_score(&events, now);
            assert!((0.0..=10.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_threshold_boundary_is_not_escalation() {
        // one fresh block weighs exactly 5.0
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "edge", DetectionKind::Block, now);

        assert_eq!(scorer.score("edge", now).unwrap(), 5.0);
        assert!(!scorer.should_escalate("edge", now).unwrap());
    }

    #[test]
    fn test_score_refreshes_session_health() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "s1", DetectionKind::Success, now - Duration::hours(2));
        record(&ledger, "s1", DetectionKind::Block, now - Duration::minutes(1));
        record(&ledger, "s1", DetectionKind::Block, now - Duration::minutes(2));

        let score = scorer.score("s1", now).unwrap();
        let health = ledger.health("s1").unwrap().unwrap();

        assert_eq!(health.risk_score, score);
        assert_eq!(health.failure_count, 2);
        assert_eq!(health.status, SessionStatus::Flagged);
        assert!(health.last_success.is_some());
    }

    #[test]
    fn test_session_risk_status() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "s1", DetectionKind::Suspicious, now);

        let state = scorer.session_risk("s1", now).unwrap();
        assert_eq!(state.status, SessionStatus::Active);
        assert!((state.risk_score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_scoring_leaves_latest_health() {
        let (ledger, scorer) = setup();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let scorer = scorer.clone();
                std::thread::spawn(move || {
                    ledger
                        .append(&DetectionEvent::new(DetectionKind::Suspicious, "shared", "x", "y", ""))
                        .unwrap();
                    scorer.score("shared", Utc::now()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // the last scorer to take the lock saw every append
        let health = ledger.health("shared").unwrap().unwrap();
        assert_eq!(health.failure_count, 8);
        assert_eq!(health.risk_score, 10.0);
    }

    #[test]
    fn test_last_success_survives_window() {
        let (ledger, scorer) = setup();
        let now = Utc::now();
        record(&ledger, "s1", DetectionKind::Success, now - Duration::hours(1));
        scorer.score("s1", now).unwrap();
        let first = ledger.health("s1").unwrap().unwrap().last_success;
        assert!(first.is_some());

        // a day later the success has left the window
        scorer.score("s1", now + Duration::hours(30)).unwrap();
        assert_eq!(ledger.health("s1").unwrap().unwrap().last_success, first);
    }
}
