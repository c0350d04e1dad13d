pub mod bootstrap;
pub mod config;
pub mod db;
pub mod init;
pub mod log;
pub mod media;
pub mod notify;
pub mod overtime;
pub mod purge;
pub mod status;
pub mod summary;
pub mod user;

use crate::config::Config;
use crate::db::users::find_user_by_login;
use crate::db::{DbHandle, init_db};
use crate::errors::{AppError, AppResult};
use crate::media::LocalMediaStore;
use crate::models::User;
use rusqlite::Connection;
use serde::Serialize;

/// How a command prints its result.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn json<T: Serialize>(&self, value: &T) -> AppResult<()> {
        let s = serde_json::to_string_pretty(value).map_err(|e| AppError::Other(e.to_string()))?;
        println!("{}", s);
        Ok(())
    }
}

/// Open the configured database with the schema brought up to date.
pub fn open_db(cfg: &Config) -> AppResult<DbHandle> {
    let db = DbHandle::open(cfg.database_path())?;
    init_db(&db.conn)?;
    Ok(db)
}

pub fn media_store(cfg: &Config) -> LocalMediaStore {
    LocalMediaStore::new(cfg.media_root_path(), cfg.media_base_url.clone())
}

/// Look a user up by username or email.
pub fn resolve_user(conn: &Connection, login: &str) -> AppResult<User> {
    find_user_by_login(conn, login.trim())?.ok_or_else(|| AppError::NotFound(format!("user '{}'", login)))
}
