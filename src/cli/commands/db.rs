use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::migrate::run_pending_migrations;
use crate::db::stats::{collect_stats, integrity_check};
use crate::db::DbHandle;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, field, header, info, success};

use super::Output;

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        vacuum,
        info: show_info,
    } = cmd
    {
        let db_path = cfg.database_path();
        let db = DbHandle::open(&db_path)?;

        if *migrate {
            info("Running migrations…");
            run_pending_migrations(&db.conn).map_err(|e| AppError::Migration(e.to_string()))?;
            success("Migration completed.");
        }

        if *show_info {
            let stats = collect_stats(&db.conn, &db_path)?;
            if out.is_json() {
                out.json(&stats)?;
            } else {
                header("Database");
                field("File", db_path.display());
                field("Size", format!("{:.2} MB", stats.file_size as f64 / (1024.0 * 1024.0)));
                field("Users", stats.users);
                for (table, n) in &stats.tables {
                    field(table.table_name(), n);
                }
                field("Pending alerts", stats.pending_alerts);
                field("First event", stats.first_event.as_deref().unwrap_or("--"));
                field("Last event", stats.last_event.as_deref().unwrap_or("--"));
            }
        }

        if *check {
            info("Running integrity check…");
            let result = integrity_check(&db.conn)?;
            if result == "ok" {
                success("Integrity check passed.");
            } else {
                error(format!("Integrity check failed: {}", result));
            }
        }

        if *vacuum {
            info("Running VACUUM…");
            db.conn.execute_batch("VACUUM;")?;
            success("Vacuum completed.");
        }
    }

    Ok(())
}
