use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::RetentionPurge;
use crate::errors::AppResult;
use crate::ui::messages::{header, success, warning};
use crate::utils::time::format_ts;

use super::{Output, media_store, open_db};

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    if let Commands::Purge {
        days,
        dry_run,
        batch_size,
    } = cmd
    {
        let db = open_db(cfg)?;
        let store = media_store(cfg);
        let days = days.unwrap_or(cfg.retention.days);
        let batch_size = batch_size.unwrap_or(cfg.retention.batch_size);

        let report = RetentionPurge::new(&db.conn, &store, batch_size).purge_older_than(days, *dry_run)?;

        if out.is_json() {
            return out.json(&report);
        }

        let title = if report.dry_run { "Retention purge (dry run)" } else { "Retention purge" };
        header(format!("{} before {}", title, format_ts(report.cutoff)));

        let verb = if report.dry_run { "would delete" } else { "deleted" };
        for t in &report.tables {
            println!(
                "  {:<18} {} {} rows, {} files",
                t.table.table_name(),
                verb,
                t.rows,
                t.files
            );
            if t.file_errors > 0 {
                warning(format!("{}: {} files could not be removed", t.table, t.file_errors));
            }
            if t.rejected_paths > 0 {
                warning(format!("{}: {} unsafe media paths skipped", t.table, t.rejected_paths));
            }
        }
        success(format!("Total: {} rows, {} files", report.total_rows(), report.total_files()));
    }
    Ok(())
}
