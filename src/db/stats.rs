use crate::db::purge::ManagedTable;
use crate::errors::AppResult;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub file_size: u64,
    pub users: i64,
    pub tables: Vec<(ManagedTable, i64)>,
    pub pending_alerts: i64,
    pub first_event: Option<String>,
    pub last_event: Option<String>,
}

pub fn collect_stats(conn: &Connection, db_path: &Path) -> AppResult<DbStats> {
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;

    let mut tables = Vec::with_capacity(ManagedTable::ALL.len());
    for table in ManagedTable::ALL {
        let sql = format!("SELECT COUNT(*) FROM {}", table.table_name());
        let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        tables.push((table, n));
    }

    let pending_alerts: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activity_events WHERE event_type = 'inactive' AND notified = 0",
        [],
        |r| r.get(0),
    )?;

    let first_event: Option<String> = conn
        .query_row(
            "SELECT occurred_at FROM activity_events ORDER BY occurred_at ASC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let last_event: Option<String> = conn
        .query_row(
            "SELECT occurred_at FROM activity_events ORDER BY occurred_at DESC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;

    Ok(DbStats {
        file_size,
        users,
        tables,
        pending_alerts,
        first_event,
        last_event,
    })
}

/// `PRAGMA integrity_check`; `"ok"` when healthy.
pub fn integrity_check(conn: &Connection) -> AppResult<String> {
    Ok(conn.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?)
}
