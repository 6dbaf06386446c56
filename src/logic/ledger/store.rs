//! SQLite-backed detection ledger
//!
//! One connection behind one mutex. Every public method is a complete
//! critical section, so concurrent sessions never interleave half-written
//! rows.

use std::path::Path;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{DetectionEvent, DetectionKind, SessionHealthRecord, SessionStatus};
use crate::logic::error::PersistenceError;

const SCHEMA_SQL: &str = r#"
-- Append-only detection ledger
CREATE TABLE IF NOT EXISTS detection_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    kind TEXT NOT NULL,
    source_address TEXT NOT NULL,
    client_signature TEXT NOT NULL,
    session_id TEXT NOT NULL,
    details TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_session_ts ON detection_events(session_id, timestamp);

-- Cached per-session health, refreshed on every score
CREATE TABLE IF NOT EXISTS session_health (
    session_id TEXT PRIMARY KEY,
    last_success INTEGER,
    failure_count INTEGER NOT NULL DEFAULT 0,
    risk_score REAL NOT NULL DEFAULT 0.0,
    status TEXT NOT NULL DEFAULT 'active'
);
"#;

pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    /// Open or create the ledger at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let ledger = Self::with_connection(conn)?;
        log::info!("Detection ledger opened: {}", path.display());
        Ok(ledger)
    }

    /// Open an in-memory ledger (for testing)
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // ==================== Events ====================

    /// Append one event. Durable once this returns.
    pub fn append(&self, event: &DetectionEvent) -> Result<(), PersistenceError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO detection_events
                (timestamp, kind, source_address, client_signature, session_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.timestamp.timestamp_millis(),
                event.kind.as_str(),
                event.source_address,
                event.client_signature,
                event.session_id,
                event.details,
            ],
        )?;

        log::debug!("Ledger append: session={} kind={}", event.session_id, event.kind);
        Ok(())
    }

    /// Events of `session_id` strictly newer than `since`, newest first
    pub fn query(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DetectionEvent>, PersistenceError> {
        let conn = self.conn.lock();
        query_window(&conn, session_id, since)
    }

    /// Total events stored for a session
    pub fn count(&self, session_id: &str) -> Result<u64, PersistenceError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM detection_events WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    // ==================== Session Health ====================

    pub fn upsert_health(&self, record: &SessionHealthRecord) -> Result<(), PersistenceError> {
        let conn = self.conn.lock();
        write_health(&conn, record)
    }

    pub fn health(&self, session_id: &str) -> Result<Option<SessionHealthRecord>, PersistenceError> {
        let conn = self.conn.lock();
        read_health(&conn, session_id)
    }

    /// Read the event window and the cached row, derive the new row with
    /// `derive`, and store it, all under one lock.
    pub fn update_health<T, F>(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
        derive: F,
    ) -> Result<T, PersistenceError>
    where
        F: FnOnce(&[DetectionEvent], Option<SessionHealthRecord>) -> (T, SessionHealthRecord),
    {
        let conn = self.conn.lock();
        let events = query_window(&conn, session_id, since)?;
        let cached = read_health(&conn, session_id)?;
        let (value, record) = derive(&events, cached);
        write_health(&conn, &record)?;
        Ok(value)
    }

    /// Run raw SQL against the store (for testing)
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<(), PersistenceError> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }
}

// ============================================================================
// STATEMENTS (caller holds the lock)
// ============================================================================

fn query_window(
    conn: &Connection,
    session_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<DetectionEvent>, PersistenceError> {
    let mut stmt = conn.prepare_cached(
        "SELECT timestamp, kind, source_address, client_signature, session_id, details
         FROM detection_events
         WHERE session_id = ?1 AND timestamp > ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![session_id, since.timestamp_millis()], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (ts, kind, source_address, client_signature, session_id, details) = row?;
        let Some(kind) = DetectionKind::parse(&kind) else {
            log::debug!("Skipping ledger row with unrecognized kind '{}'", kind);
            continue;
        };
        events.push(DetectionEvent {
            timestamp: millis_to_utc(ts),
            kind,
            source_address,
            client_signature,
            session_id,
            details,
        });
    }

    Ok(events)
}

fn write_health(conn: &Connection, record: &SessionHealthRecord) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT INTO session_health (session_id, last_success, failure_count, risk_score, status)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(session_id) DO UPDATE SET
            last_success = excluded.last_success,
            failure_count = excluded.failure_count,
            risk_score = excluded.risk_score,
            status = excluded.status",
        params![
            record.session_id,
            record.last_success.map(|t| t.timestamp_millis()),
            record.failure_count,
            record.risk_score,
            record.status.as_str(),
        ],
    )?;
    Ok(())
}

fn read_health(conn: &Connection, session_id: &str) -> Result<Option<SessionHealthRecord>, PersistenceError> {
    let record = conn
        .query_row(
            "SELECT session_id, last_success, failure_count, risk_score, status
             FROM session_health WHERE session_id = ?1",
            params![session_id],
            |row| {
                Ok(SessionHealthRecord {
                    session_id: row.get(0)?,
                    last_success: row.get::<_, Option<i64>>(1)?.map(millis_to_utc),
                    failure_count: row.get(2)?,
                    risk_score: row.get(3)?,
                    status: SessionStatus::parse(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()?;
    Ok(record)
}

fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}
