//! User provisioning, the admin bootstrap and login.

use crate::config::AdminBootstrap;
use crate::credentials::CredentialHasher;
use crate::db::log::oplog_best_effort;
use crate::db::users::{self, find_user_by_login, insert_user};
use crate::errors::{AppError, AppResult};
use crate::models::{NewUser, Role, User, UserUpdate};
use crate::utils::time::parse_shift_time;
use regex::Regex;
use rusqlite::{Connection, params};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn check_email(email: &str) -> AppResult<()> {
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| AppError::Other(e.to_string()))?;
    if !re.is_match(email) {
        return Err(AppError::InvalidArgument(format!("invalid email '{}'", email)));
    }
    Ok(())
}

fn check_new_user(user: &NewUser, plaintext: &str) -> AppResult<()> {
    if user.username.trim().is_empty() {
        return Err(AppError::InvalidArgument("username must not be empty".into()));
    }
    if user.name.trim().is_empty() {
        return Err(AppError::InvalidArgument("name must not be empty".into()));
    }
    check_email(&user.email)?;
    if plaintext.is_empty() {
        return Err(AppError::InvalidArgument("password must not be empty".into()));
    }
    Ok(())
}

fn exists(conn: &Connection, username: &str, email: &str) -> AppResult<Option<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE username = ?1 OR email = ?2 ORDER BY id LIMIT 1")?;
    let mut rows = stmt.query(params![username, email])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Create a user. Username and email must both be unused.
pub fn create_user(
    conn: &Connection,
    hasher: &dyn CredentialHasher,
    user: NewUser,
    plaintext: &str,
) -> AppResult<i64> {
    check_new_user(&user, plaintext)?;

    if exists(conn, &user.username, &user.email)?.is_some() {
        return Err(AppError::InvalidArgument(format!(
            "username '{}' or email '{}' already in use",
            user.username, user.email
        )));
    }

    let hash = hasher.hash(plaintext)?;
    let id = insert_user(conn, &user, &hash)?;

    tracing::info!(user_id = id, username = %user.username, role = user.role.to_db_str(), "user created");
    oplog_best_effort(
        conn,
        "user_create",
        &user.username,
        &format!("created {} '{}'", user.role.to_db_str(), user.username),
    );
    Ok(id)
}

/// Outcome of [`bootstrap_admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(i64),
    AlreadyPresent(i64),
}

impl BootstrapOutcome {
    pub fn id(&self) -> i64 {
        match self {
            BootstrapOutcome::Created(id) | BootstrapOutcome::AlreadyPresent(id) => *id,
        }
    }
}

/// Ensure the configured admin exists. Running it again changes nothing.
pub fn bootstrap_admin(
    conn: &Connection,
    hasher: &dyn CredentialHasher,
    admin: &AdminBootstrap,
) -> AppResult<BootstrapOutcome> {
    if let Some(id) = exists(conn, &admin.username, &admin.email)? {
        tracing::info!(user_id = id, username = %admin.username, "admin already present");
        return Ok(BootstrapOutcome::AlreadyPresent(id));
    }

    let new_user = NewUser {
        username: admin.username.clone(),
        name: admin.name.clone(),
        department: admin.department.clone(),
        email: admin.email.clone(),
        role: Role::Admin,
        shift_start_time: parse_shift_time(&admin.shift_start_time)?,
        shift_end_time: parse_shift_time(&admin.shift_end_time)?,
    };

    create_user(conn, hasher, new_user, &admin.password).map(BootstrapOutcome::Created)
}

/// Verify credentials given a username or email.
/// `Ok(None)` for an unknown login or a wrong password.
pub fn login(
    conn: &Connection,
    hasher: &dyn CredentialHasher,
    login: &str,
    plaintext: &str,
) -> AppResult<Option<User>> {
    let Some(user) = find_user_by_login(conn, login.trim())? else {
        return Ok(None);
    };

    if hasher.verify(plaintext, &user.password_hash)? {
        Ok(Some(user))
    } else {
        tracing::debug!(login, "login rejected");
        Ok(None)
    }
}

pub fn admin_update_user(conn: &Connection, user_id: i64, update: &UserUpdate) -> AppResult<()> {
    if let Some(email) = &update.email {
        check_email(email)?;
    }
    if update.is_empty() {
        return Ok(());
    }

    users::admin_update_user(conn, user_id, update)?;
    oplog_best_effort(conn, "user_update", &user_id.to_string(), "profile updated");
    Ok(())
}

/// Delete a user together with their events, overtime and media rows.
pub fn admin_delete_user(conn: &Connection, user_id: i64) -> AppResult<()> {
    if !users::admin_delete_user(conn, user_id)? {
        return Err(AppError::NotFound(format!("user {}", user_id)));
    }
    oplog_best_effort(conn, "user_delete", &user_id.to_string(), "user deleted");
    Ok(())
}
