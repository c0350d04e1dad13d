use crate::cli::parser::{Commands, OvertimeAction};
use crate::config::Config;
use crate::core::overtime::{add_overtime, overtime_records, total_overtime};
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::date::parse_date;
use crate::utils::secs2readable;
use serde_json::json;

use super::{Output, open_db, resolve_user};

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    let Commands::Overtime { action } = cmd else {
        return Ok(());
    };

    match action {
        OvertimeAction::Add { user, date, seconds } => {
            let day = parse_date(date)?;
            let db = open_db(cfg)?;
            let uid = resolve_user(&db.conn, user)?.id;

            add_overtime(&db.conn, uid, day, *seconds)?;
            let total = total_overtime(&db.conn, uid, day, day)?;

            if out.is_json() {
                return out.json(&json!({ "user_id": uid, "date": day, "overtime_seconds": total }));
            }
            success(format!("{} overtime on {}: {}", user, day, secs2readable(total)));
        }

        OvertimeAction::Total { user, from, to } => {
            let (start, end) = (parse_date(from)?, parse_date(to)?);
            let db = open_db(cfg)?;
            let uid = resolve_user(&db.conn, user)?.id;

            let total = total_overtime(&db.conn, uid, start, end)?;
            if out.is_json() {
                let days = overtime_records(&db.conn, uid, start, end)?;
                return out.json(&json!({ "user_id": uid, "total_seconds": total, "days": days }));
            }
            println!("Overtime {} → {}: {} ({} s)", start, end, secs2readable(total), total);
        }
    }

    Ok(())
}
