use crate::db::overtime::{records_between, sum_between, upsert_add};
use crate::errors::{AppError, AppResult};
use crate::models::OvertimeRecord;
use crate::utils::date::check_range;
use chrono::NaiveDate;
use rusqlite::Connection;

/// Add `seconds` of overtime to the user's total for `date`.
pub fn add_overtime(conn: &Connection, user_id: i64, date: NaiveDate, seconds: i64) -> AppResult<()> {
    if seconds < 0 {
        return Err(AppError::InvalidArgument(format!(
            "overtime seconds must not be negative (got {})",
            seconds
        )));
    }

    upsert_add(conn, user_id, date, seconds)?;
    tracing::debug!(user_id, %date, seconds, "overtime accrued");
    Ok(())
}

/// Sum of overtime over the inclusive range. No rows means `0`.
pub fn total_overtime(conn: &Connection, user_id: i64, start: NaiveDate, end: NaiveDate) -> AppResult<i64> {
    check_range(start, end)?;
    sum_between(conn, user_id, start, end)
}

pub fn overtime_records(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<OvertimeRecord>> {
    check_range(start, end)?;
    records_between(conn, user_id, start, end)
}
