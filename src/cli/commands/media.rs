use crate::cli::parser::{Commands, MediaAction};
use crate::config::Config;
use crate::db::media::{record_recording, record_screenshot, recordings_for_user, screenshots_for_user};
use crate::errors::{AppError, AppResult};
use crate::models::MediaKind;
use crate::ui::messages::{info, success};
use crate::utils::time::format_ts;
use std::fs;

use super::{Output, media_store, open_db, resolve_user};

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    let Commands::Media { action } = cmd else {
        return Ok(());
    };
    let db = open_db(cfg)?;
    let store = media_store(cfg);

    match action {
        MediaAction::Add {
            user,
            file,
            kind,
            duration,
            event,
        } => {
            if *duration < 0 {
                return Err(AppError::InvalidArgument(format!(
                    "recording duration must not be negative (got {})",
                    duration
                )));
            }
            let uid = resolve_user(&db.conn, user)?.id;
            let bytes = fs::read(file)?;

            let (id, url) = match MediaKind::from(*kind) {
                MediaKind::Screenshot => record_screenshot(&db.conn, &store, uid, &bytes, *event, None)?,
                MediaKind::Recording => {
                    record_recording(&db.conn, &store, uid, &bytes, *duration, *event, None)?
                }
            };
            success(format!("Stored {} (id={})", url, id));
        }

        MediaAction::List { user, kind, limit } => {
            let uid = resolve_user(&db.conn, user)?.id;
            let assets = match MediaKind::from(*kind) {
                MediaKind::Screenshot => screenshots_for_user(&db.conn, uid, *limit)?,
                MediaKind::Recording => recordings_for_user(&db.conn, uid, *limit)?,
            };

            if out.is_json() {
                return out.json(&assets);
            }
            if assets.is_empty() {
                info("No media.");
            }
            for a in assets {
                println!(
                    "{:>5}  {}  {:<10} {}",
                    a.id,
                    format_ts(a.captured_at),
                    a.mime,
                    a.url.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
