use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};

use super::Output;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    if let Commands::Config { print_config: true } = cmd {
        if out.is_json() {
            return out.json(cfg);
        }
        println!("📄 Current configuration:\n");
        let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
        println!("{}", yaml);
    }
    Ok(())
}
