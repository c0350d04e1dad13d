//! Row selection and batched deletion for the retention purge.

use crate::errors::AppResult;
use crate::utils::date::format_date;
use crate::utils::time::format_ts;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;

/// Default number of ids per `DELETE … WHERE id IN (…)` statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Largest batch SQLite accepts: one bound parameter per id.
pub const MAX_BATCH_SIZE: usize = 32766;

/// Tables the retention purge manages, in the order it processes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedTable {
    Screenshots,
    ScreenRecordings,
    ActivityEvents,
    UserOvertimes,
}

impl ManagedTable {
    pub const ALL: [ManagedTable; 4] = [
        ManagedTable::Screenshots,
        ManagedTable::ScreenRecordings,
        ManagedTable::ActivityEvents,
        ManagedTable::UserOvertimes,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            ManagedTable::Screenshots => "screenshots",
            ManagedTable::ScreenRecordings => "screen_recordings",
            ManagedTable::ActivityEvents => "activity_events",
            ManagedTable::UserOvertimes => "user_overtimes",
        }
    }

    /// Column the row's age is measured on.
    pub fn age_column(&self) -> &'static str {
        match self {
            ManagedTable::Screenshots => "taken_at",
            ManagedTable::ScreenRecordings => "recorded_at",
            ManagedTable::ActivityEvents => "occurred_at",
            ManagedTable::UserOvertimes => "ot_date",
        }
    }

    /// Rows of this table own a file in the media store.
    pub fn has_media(&self) -> bool {
        matches!(self, ManagedTable::Screenshots | ManagedTable::ScreenRecordings)
    }

    /// Overtime rows carry a calendar date rather than a timestamp.
    pub fn ages_by_date(&self) -> bool {
        matches!(self, ManagedTable::UserOvertimes)
    }

    fn cutoff_value(&self, cutoff: DateTime<Utc>) -> String {
        if self.ages_by_date() {
            format_date(cutoff.date_naive())
        } else {
            format_ts(cutoff)
        }
    }
}

impl std::fmt::Display for ManagedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Rows older than `cutoff`: `(id, url)`, the url only for media tables.
pub fn aged_rows(
    conn: &Connection,
    table: ManagedTable,
    cutoff: DateTime<Utc>,
) -> AppResult<Vec<(i64, Option<String>)>> {
    let url_col = if table.has_media() { "url" } else { "NULL" };
    let sql = format!(
        "SELECT id, {} FROM {} WHERE {} < ?1 ORDER BY id",
        url_col,
        table.table_name(),
        table.age_column()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([table.cutoff_value(cutoff)], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Outcome of a batched delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchDelete {
    /// Rows actually removed, summed over batches.
    pub rows: u64,
    /// Statements issued.
    pub batches: usize,
}

/// Delete `ids` from `table` in chunks of at most `batch_size`, capped at
/// [`MAX_BATCH_SIZE`]. Ids that no longer exist simply do not count.
pub fn delete_by_ids(
    conn: &Connection,
    table: ManagedTable,
    ids: &[i64],
    batch_size: usize,
) -> AppResult<BatchDelete> {
    let mut out = BatchDelete::default();
    if ids.is_empty() {
        return Ok(out);
    }

    for chunk in ids.chunks(batch_size.clamp(1, MAX_BATCH_SIZE)) {
        let placeholders = vec!["?"; chunk.len()].join(",");
        let sql = format!(
            "DELETE FROM {} WHERE id IN ({})",
            table.table_name(),
            placeholders
        );
        let n = conn.execute(&sql, params_from_iter(chunk.iter()))?;
        out.rows += n as u64;
        out.batches += 1;
    }

    Ok(out)
}
