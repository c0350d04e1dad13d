use crate::db::events::{self, events_between};
use crate::errors::AppResult;
use crate::models::{ActivityEvent, EventType};
use crate::utils::date::check_range;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

pub const DEFAULT_HISTORY_LIMIT: i64 = 300;

/// Activity totals of one user over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub active_seconds: i64,
    pub inactive_seconds: i64,
    pub inactive_events: u64,
    pub shift_starts: u64,
}

/// Totals over the inclusive range.
///
/// An `inactive` event carries the length of the active streak it ends and an
/// `active` event the length of the inactive one, so each side is summed from
/// the opposite event type.
pub fn activity_summary(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<ActivitySummary> {
    check_range(start, end)?;

    let mut s = ActivitySummary::default();
    for ev in events_between(conn, user_id, start, end)? {
        let secs = ev.active_duration_seconds.unwrap_or(0);
        match ev.event_type {
            EventType::Inactive => {
                s.inactive_events += 1;
                s.active_seconds = s.active_seconds.saturating_add(secs);
            }
            EventType::Active => s.inactive_seconds = s.inactive_seconds.saturating_add(secs),
            EventType::ShiftStart => s.shift_starts += 1,
        }
    }
    Ok(s)
}

/// Recent inactive events, newest first.
pub fn inactive_history(
    conn: &Connection,
    user_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
    limit: Option<i64>,
) -> AppResult<Vec<ActivityEvent>> {
    if let Some((start, end)) = range {
        check_range(start, end)?;
    }
    events::inactive_history(conn, user_id, range, limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(0))
}
