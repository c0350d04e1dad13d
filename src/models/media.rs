use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Screenshot,
    Recording,
}

impl MediaKind {
    /// Sub-directory of the media root holding this kind of file.
    pub fn subdir(&self) -> &'static str {
        match self {
            MediaKind::Screenshot => "screenshots",
            MediaKind::Recording => "recordings",
        }
    }

    pub fn default_mime(&self) -> &'static str {
        match self {
            MediaKind::Screenshot => "image/png",
            MediaKind::Recording => "video/mp4",
        }
    }

    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Screenshot => "png",
            MediaKind::Recording => "mp4",
        }
    }
}

/// Screenshot or recording row. `duration_seconds` is only set for recordings.
/// `event_id` is a weak link: it becomes `None` when the event is purged.
#[derive(Debug, Clone, Serialize)]
pub struct MediaAsset {
    pub id: i64,
    pub kind: MediaKind,
    pub user_id: i64,
    pub event_id: Option<i64>,
    pub captured_at: DateTime<Utc>,
    pub mime: String,
    pub url: Option<String>,
    pub duration_seconds: Option<i64>,
}
