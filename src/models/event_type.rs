use serde::Serialize;

/// Kind of an activity event, as written to `activity_events.event_type`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ShiftStart,
    Active,
    Inactive,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::ShiftStart, EventType::Active, EventType::Inactive];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventType::ShiftStart => "shift_start",
            EventType::Active => "active",
            EventType::Inactive => "inactive",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "shift_start" => Some(EventType::ShiftStart),
            "active" => Some(EventType::Active),
            "inactive" => Some(EventType::Inactive),
            _ => None,
        }
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, EventType::Inactive)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_str())
    }
}
