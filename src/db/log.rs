use crate::errors::AppResult;
use crate::utils::time::{format_ts, now};
use rusqlite::{Connection, params};
use serde::Serialize;

/// One row of the internal `log` table.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

/// Write an internal log line into the `log` table.
pub fn oplog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![format_ts(now()), operation, target, message])?;

    Ok(())
}

/// Same as [`oplog`] for callers that must not fail because of the audit line.
pub fn oplog_best_effort(conn: &Connection, operation: &str, target: &str, message: &str) {
    if let Err(e) = oplog(conn, operation, target, message) {
        tracing::warn!(error = %e, operation, target, "failed to write internal log line");
    }
}

pub fn load_log(conn: &Connection) -> AppResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, target, message FROM log ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(LogEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            operation: row.get(2)?,
            target: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            message: row.get(4)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
