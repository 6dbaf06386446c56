//! Risk Guard - Command Line Entry Point
//!
//! Prints the current risk state of every session id given on the command
//! line, plus the egress point a new session would start on. With no
//! arguments a fresh session id is generated.

use anyhow::Context;
use risk_guard::constants;
use risk_guard::{Guard, GuardConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting risk-guard v{}", constants::APP_VERSION);

    let config = GuardConfig::from_env();
    let guard = Guard::open(config).context("failed to open guard")?;

    let mut sessions: Vec<String> = std::env::args().skip(1).collect();
    if sessions.is_empty() {
        let generated = uuid::Uuid::new_v4().to_string();
        log::info!("No session given, using {}", generated);
        sessions.push(generated);
    }

    let mut states = Vec::with_capacity(sessions.len());
    for session_id in &sessions {
        let state = guard
            .session_risk(session_id)
            .with_context(|| format!("failed to score session {}", session_id))?;
        if guard.should_escalate(session_id)? {
            log::warn!("Session {} is above the escalation threshold", session_id);
        }
        states.push(state);
    }

    let report = serde_json::json!({
        "sessions": states,
        "best_egress": guard.best_egress(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
