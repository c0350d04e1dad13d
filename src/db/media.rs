//! Screenshot and recording rows.
//!
//! A row and its file are one unit: the file is written before the row is
//! inserted, and removed again if the insert fails.

use crate::db::users::ts_column;
use crate::errors::AppResult;
use crate::media::MediaStore;
use crate::models::{MediaAsset, MediaKind};
use crate::utils::time::{format_ts, now};
use rusqlite::{Connection, params};

/// Remove a just-written file after its row could not be stored.
fn discard_file(store: &dyn MediaStore, url: &str) {
    match store.resolve(url) {
        Ok(path) => {
            if let Err(e) = store.remove(&path) {
                tracing::warn!(error = %e, path = %path.display(), "failed to discard orphan media file");
            }
        }
        Err(e) => tracing::warn!(error = %e, "cannot resolve orphan media file"),
    }
}

/// Save a screenshot file and record it. Returns `(row id, url)`.
pub fn record_screenshot(
    conn: &Connection,
    store: &dyn MediaStore,
    user_id: i64,
    bytes: &[u8],
    event_id: Option<i64>,
    mime: Option<&str>,
) -> AppResult<(i64, String)> {
    let kind = MediaKind::Screenshot;
    let url = store.save(kind, bytes, &format!("screenshot.{}", kind.default_extension()))?;

    let inserted = conn.execute(
        "INSERT INTO screenshots (user_id, event_id, taken_at, mime, url)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            event_id,
            format_ts(now()),
            mime.unwrap_or(kind.default_mime()),
            url
        ],
    );

    match inserted {
        Ok(_) => Ok((conn.last_insert_rowid(), url)),
        Err(e) => {
            discard_file(store, &url);
            Err(e.into())
        }
    }
}

/// Save a recording file and record it. Returns `(row id, url)`.
pub fn record_recording(
    conn: &Connection,
    store: &dyn MediaStore,
    user_id: i64,
    bytes: &[u8],
    duration_seconds: i64,
    event_id: Option<i64>,
    mime: Option<&str>,
) -> AppResult<(i64, String)> {
    let kind = MediaKind::Recording;
    let url = store.save(kind, bytes, &format!("recording.{}", kind.default_extension()))?;

    let inserted = conn.execute(
        "INSERT INTO screen_recordings (user_id, event_id, recorded_at, duration_seconds, mime, url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            event_id,
            format_ts(now()),
            duration_seconds,
            mime.unwrap_or(kind.default_mime()),
            url
        ],
    );

    match inserted {
        Ok(_) => Ok((conn.last_insert_rowid(), url)),
        Err(e) => {
            discard_file(store, &url);
            Err(e.into())
        }
    }
}

pub fn screenshots_for_user(conn: &Connection, user_id: i64, limit: i64) -> AppResult<Vec<MediaAsset>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, event_id, taken_at, mime, url
         FROM screenshots WHERE user_id = ?1
         ORDER BY taken_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit], |row| {
        Ok(MediaAsset {
            id: row.get("id")?,
            kind: MediaKind::Screenshot,
            user_id: row.get("user_id")?,
            event_id: row.get("event_id")?,
            captured_at: ts_column(row, "taken_at")?,
            mime: row.get("mime")?,
            url: row.get("url")?,
            duration_seconds: None,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn recordings_for_user(conn: &Connection, user_id: i64, limit: i64) -> AppResult<Vec<MediaAsset>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, event_id, recorded_at, duration_seconds, mime, url
         FROM screen_recordings WHERE user_id = ?1
         ORDER BY recorded_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit], |row| {
        Ok(MediaAsset {
            id: row.get("id")?,
            kind: MediaKind::Recording,
            user_id: row.get("user_id")?,
            event_id: row.get("event_id")?,
            captured_at: ts_column(row, "recorded_at")?,
            mime: row.get("mime")?,
            url: row.get("url")?,
            duration_seconds: Some(row.get("duration_seconds")?),
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
