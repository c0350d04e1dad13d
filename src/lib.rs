//! idletracker library root.
//! Exposes the CLI parser, the high-level run() function and the engine modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod credentials;
pub mod db;
pub mod errors;
pub mod logging;
pub mod media;
pub mod models;
pub mod transport;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands::{self, Output};
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let out = Output::new(cli.json);
    match &cli.command {
        Commands::Init => commands::init::handle(cli, cfg),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg, out),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg, out),
        Commands::BootstrapAdmin => commands::bootstrap::handle(cfg),
        Commands::User { .. } => commands::user::handle(&cli.command, cfg, out),
        Commands::Status { .. } => commands::status::handle(&cli.command, cfg, out),
        Commands::Overtime { .. } => commands::overtime::handle(&cli.command, cfg, out),
        Commands::Media { .. } => commands::media::handle(&cli.command, cfg, out),
        Commands::Notify => commands::notify::handle(cfg, out),
        Commands::Purge { .. } => commands::purge::handle(&cli.command, cfg, out),
        Commands::Summary { .. } | Commands::History { .. } => {
            commands::summary::handle(&cli.command, cfg, out)
        }
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg, out),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // config is loaded once; command-line overrides win
    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(root) = &cli.media_root {
        cfg.media_root = root.clone();
    }

    logging::init(&cfg.log_level);

    dispatch(&cli, &cfg)
}
