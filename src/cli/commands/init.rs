use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::log::oplog_best_effort;
use crate::db::DbHandle;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// Handle the `init` command
///
/// This initializes:
///  - the configuration file (skipped in test mode)
///  - the database directory and media root
///  - all pending DB migrations
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let db_path = cfg.init_all(cli.config.as_deref(), cli.test)?;

    info("Initializing idletracker…");
    if !cli.test {
        let path = cli.config.clone().unwrap_or_else(Config::config_file);
        info(format!("Config file : {}", path.display()));
    }
    info(format!("Database    : {}", db_path.display()));
    info(format!("Media root  : {}", cfg.media_root_path().display()));

    let db = DbHandle::open(&db_path)?;
    init_db(&db.conn)?;

    oplog_best_effort(
        &db.conn,
        "init",
        "database",
        &format!("Database initialized at {}", db_path.display()),
    );

    success(format!("Database initialized at {}", db_path.display()));
    Ok(())
}
