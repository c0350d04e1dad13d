use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::StatusTracker;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::time::format_ts;

use super::{Output, open_db, resolve_user};

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    if let Commands::Status {
        user,
        status,
        duration,
    } = cmd
    {
        let mut db = open_db(cfg)?;
        let uid = resolve_user(&db.conn, user)?.id;

        let event = db.with_conn(|conn| StatusTracker::set_status(conn, uid, status, *duration))?;

        if out.is_json() {
            return out.json(&event);
        }
        success(format!(
            "{} is now {} (event {} at {})",
            user,
            event.event_type,
            event.id,
            format_ts(event.occurred_at)
        ));
    }
    Ok(())
}
