use crate::db::events::insert_event;
use crate::db::users::{get_user, update_status};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityEvent, EventType, UserStatus};
use crate::utils::time::now;
use rusqlite::{Connection, TransactionBehavior};

/// Records status transitions.
///
/// Each call updates the user's current status and appends one event in a
/// single transaction. Calls for the same user must be serialized by the
/// caller; nothing here orders two concurrent transitions of one user.
pub struct StatusTracker;

impl StatusTracker {
    /// Record a transition to `status` (`shift_start`, `active` or `inactive`).
    ///
    /// `active_duration_seconds` is stored as given on the new event.
    pub fn set_status(
        conn: &mut Connection,
        user_id: i64,
        status: &str,
        active_duration_seconds: Option<i64>,
    ) -> AppResult<ActivityEvent> {
        let event_type =
            EventType::from_db_str(status).ok_or_else(|| AppError::InvalidStatus(status.to_string()))?;

        if let Some(d) = active_duration_seconds
            && d < 0
        {
            return Err(AppError::InvalidArgument(format!(
                "active duration must not be negative (got {})",
                d
            )));
        }

        Self::record(conn, user_id, event_type, active_duration_seconds)
    }

    /// `true` records `active`, `false` records `inactive`.
    pub fn set_active(
        conn: &mut Connection,
        user_id: i64,
        is_active: bool,
        active_duration_seconds: Option<i64>,
    ) -> AppResult<ActivityEvent> {
        let status = if is_active { EventType::Active } else { EventType::Inactive };
        Self::set_status(conn, user_id, status.to_db_str(), active_duration_seconds)
    }

    fn record(
        conn: &mut Connection,
        user_id: i64,
        event_type: EventType,
        active_duration_seconds: Option<i64>,
    ) -> AppResult<ActivityEvent> {
        let at = now();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if update_status(&tx, user_id, UserStatus::from(event_type), at)? == 0 {
            // dropping `tx` rolls back
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        let id = insert_event(&tx, user_id, event_type, at, active_duration_seconds)?;
        tx.commit()?;

        tracing::debug!(user_id, event_id = id, status = %event_type, "status transition recorded");

        Ok(ActivityEvent {
            id,
            user_id,
            event_type,
            occurred_at: at,
            active_duration_seconds,
            notified: false,
        })
    }

    /// Current status of a user.
    pub fn current_status(conn: &Connection, user_id: i64) -> AppResult<UserStatus> {
        get_user(conn, user_id)?
            .map(|u| u.status)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }
}
