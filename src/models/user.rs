use super::event_type::EventType;
use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// Current status held on the user row. `Off` is only ever a starting value;
/// transitions recorded by the status tracker are the `EventType` variants.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Off,
    ShiftStart,
    Active,
    Inactive,
}

impl UserStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            UserStatus::Off => "off",
            UserStatus::ShiftStart => "shift_start",
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(UserStatus::Off),
            "shift_start" => Some(UserStatus::ShiftStart),
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

impl From<EventType> for UserStatus {
    fn from(kind: EventType) -> Self {
        match kind {
            EventType::ShiftStart => UserStatus::ShiftStart,
            EventType::Active => UserStatus::Active,
            EventType::Inactive => UserStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub department: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub shift_start_time: NaiveTime,
    pub shift_end_time: NaiveTime,
    pub shift_duration_seconds: i64,
    pub status: UserStatus,
    pub last_status_change: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for provisioning a user. The password hash is supplied by the
/// credential collaborator; the shift duration is derived on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub department: String,
    pub email: String,
    pub role: Role,
    pub shift_start_time: NaiveTime,
    pub shift_end_time: NaiveTime,
}

/// Administrative profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub shift_start_time: Option<NaiveTime>,
    pub shift_end_time: Option<NaiveTime>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.name.is_none()
            && self.department.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.shift_start_time.is_none()
            && self.shift_end_time.is_none()
    }

    pub fn touches_shift(&self) -> bool {
        self.shift_start_time.is_some() || self.shift_end_time.is_some()
    }
}
