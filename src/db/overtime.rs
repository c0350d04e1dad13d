use crate::db::users::conversion_error;
use crate::errors::{AppError, AppResult};
use crate::models::OvertimeRecord;
use crate::utils::date::{format_date, parse_date};
use chrono::NaiveDate;
use rusqlite::{Connection, params};

/// Add `seconds` to the `(user, date)` total, creating the row on first use.
///
/// A single statement, so concurrent writers for the same key cannot lose
/// each other's contribution.
pub fn upsert_add(conn: &Connection, user_id: i64, date: NaiveDate, seconds: i64) -> AppResult<()> {
    conn.execute(
        "INSERT INTO user_overtimes (user_id, ot_date, overtime_seconds)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, ot_date)
         DO UPDATE SET overtime_seconds = overtime_seconds + excluded.overtime_seconds",
        params![user_id, format_date(date), seconds],
    )?;
    Ok(())
}

pub fn sum_between(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<i64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(overtime_seconds), 0) FROM user_overtimes
         WHERE user_id = ?1 AND ot_date BETWEEN ?2 AND ?3",
        params![user_id, format_date(start), format_date(end)],
        |r| r.get(0),
    )?;
    Ok(total)
}

pub fn records_between(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<OvertimeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, ot_date, overtime_seconds FROM user_overtimes
         WHERE user_id = ?1 AND ot_date BETWEEN ?2 AND ?3
         ORDER BY ot_date ASC",
    )?;

    let rows = stmt.query_map(
        params![user_id, format_date(start), format_date(end)],
        |row| {
            let raw: String = row.get("ot_date")?;
            let date = parse_date(&raw).map_err(|_| conversion_error(0, AppError::InvalidDate(raw)))?;
            Ok(OvertimeRecord {
                id: row.get("id")?,
                user_id: row.get("user_id")?,
                date,
                overtime_seconds: row.get("overtime_seconds")?,
            })
        },
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
