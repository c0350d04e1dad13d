use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::errors::AppResult;
use ansi_term::Colour;

use super::{Output, open_db};

fn color_for_operation(op: &str) -> Colour {
    match op {
        "init" => Colour::RGB(255, 153, 51),
        "migration_applied" => Colour::Purple,
        "user_create" => Colour::Green,
        "user_update" => Colour::Yellow,
        "user_delete" | "purge" => Colour::Red,
        "notify" => Colour::Blue,
        _ => Colour::White,
    }
}

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    if !matches!(cmd, Commands::Log { print: true }) {
        return Ok(());
    }

    let db = open_db(cfg)?;
    let entries = load_log(&db.conn)?;

    if out.is_json() {
        return out.json(&entries);
    }

    println!("📜 Internal log:\n");

    let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
    for e in entries {
        let op_target = if e.target.is_empty() {
            e.operation.clone()
        } else {
            format!("{} ({})", e.operation, e.target)
        };
        println!(
            "{:>id_w$}  {}  {}  {}",
            e.id,
            e.date,
            color_for_operation(&e.operation).paint(format!("{:<36}", op_target)),
            e.message,
            id_w = id_w
        );
    }
    Ok(())
}
