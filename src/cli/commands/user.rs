use crate::cli::parser::{Commands, UserAction};
use crate::config::Config;
use crate::core::provisioning::{admin_delete_user, create_user};
use crate::credentials::Argon2Hasher;
use crate::db::users::list_users;
use crate::errors::AppResult;
use crate::models::{NewUser, Role};
use crate::ui::messages::{info, success};
use crate::utils::secs2readable;
use crate::utils::time::{format_shift_time, parse_shift_time};

use super::{Output, open_db, resolve_user};

pub fn handle(cmd: &Commands, cfg: &Config, out: Output) -> AppResult<()> {
    let Commands::User { action } = cmd else {
        return Ok(());
    };
    let db = open_db(cfg)?;

    match action {
        UserAction::Add {
            username,
            email,
            password,
            name,
            department,
            admin,
            shift_start,
            shift_end,
        } => {
            let new_user = NewUser {
                username: username.trim().to_string(),
                name: name.clone().unwrap_or_else(|| username.trim().to_string()),
                department: department.clone(),
                email: email.trim().to_string(),
                role: if *admin { Role::Admin } else { Role::User },
                shift_start_time: parse_shift_time(shift_start)?,
                shift_end_time: parse_shift_time(shift_end)?,
            };
            let id = create_user(&db.conn, &Argon2Hasher, new_user, password)?;
            success(format!("User '{}' created (id={})", username, id));
        }

        UserAction::List { search } => {
            let users = list_users(&db.conn, search.as_deref())?;
            if out.is_json() {
                return out.json(&users);
            }
            if users.is_empty() {
                info("No users.");
                return Ok(());
            }
            for u in users {
                println!(
                    "{:>4}  {:<16} {:<24} {:<6} {:<12} {}-{} ({})",
                    u.id,
                    u.username,
                    u.email,
                    u.role.to_db_str(),
                    u.status.to_db_str(),
                    format_shift_time(u.shift_start_time),
                    format_shift_time(u.shift_end_time),
                    secs2readable(u.shift_duration_seconds)
                );
            }
        }

        UserAction::Del { user } => {
            let u = resolve_user(&db.conn, user)?;
            admin_delete_user(&db.conn, u.id)?;
            success(format!("User '{}' deleted", u.username));
        }
    }

    Ok(())
}
