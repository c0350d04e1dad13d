use crate::db::users::{conversion_error, ts_column};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityEvent, EventType, PendingAlert};
use crate::utils::time::format_ts;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const EVENT_COLUMNS: &str =
    "id, user_id, event_type, occurred_at, active_duration_seconds, notified";

pub fn map_event(row: &Row) -> Result<ActivityEvent> {
    let kind_str: String = row.get("event_type")?;
    let event_type = EventType::from_db_str(&kind_str)
        .ok_or_else(|| conversion_error(0, AppError::InvalidStatus(kind_str.clone())))?;

    Ok(ActivityEvent {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        event_type,
        occurred_at: ts_column(row, "occurred_at")?,
        active_duration_seconds: row.get("active_duration_seconds")?,
        notified: row.get::<_, i64>("notified")? != 0,
    })
}

/// Append one event. Only the status tracker calls this.
pub fn insert_event(
    conn: &Connection,
    user_id: i64,
    event_type: EventType,
    occurred_at: DateTime<Utc>,
    active_duration_seconds: Option<i64>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO activity_events (user_id, event_type, occurred_at, active_duration_seconds, notified)
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![
            user_id,
            event_type.to_db_str(),
            format_ts(occurred_at),
            active_duration_seconds,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_event(conn: &Connection, event_id: i64) -> AppResult<Option<ActivityEvent>> {
    let sql = format!("SELECT {} FROM activity_events WHERE id = ?1", EVENT_COLUMNS);
    Ok(conn.query_row(&sql, [event_id], map_event).optional()?)
}

/// Most recent event of a user, if any.
pub fn last_event_for_user(conn: &Connection, user_id: i64) -> AppResult<Option<ActivityEvent>> {
    let sql = format!(
        "SELECT {} FROM activity_events WHERE user_id = ?1
         ORDER BY occurred_at DESC, id DESC LIMIT 1",
        EVENT_COLUMNS
    );
    Ok(conn.query_row(&sql, [user_id], map_event).optional()?)
}

pub fn count_events_for_user(conn: &Connection, user_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM activity_events WHERE user_id = ?1",
        [user_id],
        |r| r.get(0),
    )?)
}

/// Inactive events not yet notified, newest first, with the owner's identity.
pub fn fetch_unnotified_inactive(conn: &Connection) -> AppResult<Vec<PendingAlert>> {
    let mut stmt = conn.prepare(
        "SELECT ae.id, ae.user_id, u.username, u.name, u.department, u.email,
                ae.occurred_at, ae.active_duration_seconds
         FROM activity_events ae
         JOIN users u ON u.id = ae.user_id
         WHERE ae.event_type = 'inactive' AND ae.notified = 0
         ORDER BY ae.occurred_at DESC, ae.id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(PendingAlert {
            event_id: row.get("id")?,
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            name: row.get("name")?,
            department: row.get("department")?,
            email: row.get("email")?,
            occurred_at: ts_column(row, "occurred_at")?,
            active_duration_seconds: row.get("active_duration_seconds")?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// One-way flip of `notified`. Returns false when the event was already
/// notified or no longer exists.
pub fn mark_notified(conn: &Connection, event_id: i64) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE activity_events SET notified = 1 WHERE id = ?1 AND notified = 0",
        [event_id],
    )?;
    Ok(n > 0)
}

/// Events of one user within the inclusive calendar range, oldest first.
pub fn events_between(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<ActivityEvent>> {
    let sql = format!(
        "SELECT {} FROM activity_events
         WHERE user_id = ?1 AND substr(occurred_at, 1, 10) BETWEEN ?2 AND ?3
         ORDER BY occurred_at ASC, id ASC",
        EVENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![user_id, start.to_string(), end.to_string()],
        map_event,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Recent inactive events of a user, newest first.
pub fn inactive_history(
    conn: &Connection,
    user_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
    limit: i64,
) -> AppResult<Vec<ActivityEvent>> {
    let mut out = Vec::new();

    match range {
        Some((start, end)) => {
            let sql = format!(
                "SELECT {} FROM activity_events
                 WHERE user_id = ?1 AND event_type = 'inactive'
                   AND substr(occurred_at, 1, 10) BETWEEN ?2 AND ?3
                 ORDER BY occurred_at DESC, id DESC
                 LIMIT ?4",
                EVENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![user_id, start.to_string(), end.to_string(), limit],
                map_event,
            )?;
            for r in rows {
                out.push(r?);
            }
        }
        None => {
            let sql = format!(
                "SELECT {} FROM activity_events
                 WHERE user_id = ?1 AND event_type = 'inactive'
                 ORDER BY occurred_at DESC, id DESC
                 LIMIT ?2",
                EVENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            for r in stmt.query_map(params![user_id, limit], map_event)? {
                out.push(r?);
            }
        }
    }

    Ok(out)
}
