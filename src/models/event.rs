use super::event_type::EventType;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of the append-only activity log.
///
/// `active_duration_seconds` is the length of the streak that just ended:
/// on an `inactive` event it is the active time before it, on an `active`
/// event the inactive time before it. It is whatever the caller supplied.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub user_id: i64,
    pub event_type: EventType,
    pub occurred_at: DateTime<Utc>,
    pub active_duration_seconds: Option<i64>,
    pub notified: bool,
}

/// An unnotified inactivity event joined with its owner's identity.
#[derive(Debug, Clone, Serialize)]
pub struct PendingAlert {
    pub event_id: i64,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub department: String,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
    pub active_duration_seconds: Option<i64>,
}
