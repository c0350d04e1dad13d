use crate::config::Config;
use crate::core::provisioning::{BootstrapOutcome, bootstrap_admin};
use crate::credentials::Argon2Hasher;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

use super::open_db;

pub fn handle(cfg: &Config) -> AppResult<()> {
    let db = open_db(cfg)?;
    let admin = &cfg.admin_bootstrap;

    match bootstrap_admin(&db.conn, &Argon2Hasher, admin)? {
        BootstrapOutcome::Created(id) => {
            success(format!("Admin created with id={}, username={}", id, admin.username))
        }
        BootstrapOutcome::AlreadyPresent(id) => {
            info(format!("Admin already exists: {} (id={})", admin.username, id))
        }
    }
    Ok(())
}
