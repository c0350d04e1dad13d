use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::summary::{activity_summary, inactive_history};
use crate::errors::AppResult;
use crate::ui::messages::{field, header, info};
use crate::utils::date::parse_date;
use crate::utils::secs2readable;
use crate::utils::time::format_ts;

use super::{Output, open_db, resolve_user};

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    match cmd {
        Commands::Summary { user, from, to } => {
            let (start, end) = (parse_date(from)?, parse_date(to)?);
            let db = open_db(cfg)?;
            let u = resolve_user(&db.conn, user)?;

            let s = activity_summary(&db.conn, u.id, start, end)?;
            if out.is_json() {
                return out.json(&s);
            }

            header(format!("{} ({}) {} → {}", u.name, u.username, start, end));
            field("Active", secs2readable(s.active_seconds));
            field("Inactive", secs2readable(s.inactive_seconds));
            field("Inactive events", s.inactive_events);
            field("Shift starts", s.shift_starts);
        }

        Commands::History { user, from, to, limit } => {
            let range = match (from, to) {
                (Some(f), Some(t)) => Some((parse_date(f)?, parse_date(t)?)),
                _ => None,
            };
            let db = open_db(cfg)?;
            let u = resolve_user(&db.conn, user)?;

            let events = inactive_history(&db.conn, u.id, range, *limit)?;
            if out.is_json() {
                return out.json(&events);
            }
            if events.is_empty() {
                info(format!("No inactivity recorded for {}", u.username));
            }
            for ev in events {
                let active = ev
                    .active_duration_seconds
                    .map(secs2readable)
                    .unwrap_or_else(|| "--".to_string());
                let flag = if ev.notified { "notified" } else { "pending" };
                println!("{:>6}  {}  active before: {:<14} {}", ev.id, format_ts(ev.occurred_at), active, flag);
            }
        }

        _ => {}
    }
    Ok(())
}
