use crate::errors::{AppError, AppResult};
use crate::models::{NewUser, Role, User, UserStatus, UserUpdate};
use crate::utils::time::{
    format_shift_time, format_ts, parse_shift_time, parse_ts, shift_duration_seconds,
};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const USER_COLUMNS: &str = "id, username, name, department, email, password_hash, role,
     shift_start_time, shift_end_time, shift_duration_seconds, status,
     last_status_change, created_at";

pub(crate) fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn ts_column(row: &Row, name: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    parse_ts(&raw).ok_or_else(|| conversion_error(0, AppError::InvalidDate(raw)))
}

pub(crate) fn opt_ts_column(row: &Row, name: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(name)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_ts(&s)
            .map(Some)
            .ok_or_else(|| conversion_error(0, AppError::InvalidDate(s))),
    }
}

pub fn map_user(row: &Row) -> Result<User> {
    let role_str: String = row.get("role")?;
    let role = Role::from_db_str(&role_str)
        .ok_or_else(|| conversion_error(0, AppError::Other(format!("Invalid role: {}", role_str))))?;

    let status_str: String = row.get("status")?;
    let status = UserStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_error(0, AppError::InvalidStatus(status_str.clone())))?;

    let start_str: String = row.get("shift_start_time")?;
    let shift_start_time = parse_shift_time(&start_str).map_err(|e| conversion_error(0, e))?;
    let end_str: String = row.get("shift_end_time")?;
    let shift_end_time = parse_shift_time(&end_str).map_err(|e| conversion_error(0, e))?;

    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        name: row.get("name")?,
        department: row.get("department")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role,
        shift_start_time,
        shift_end_time,
        shift_duration_seconds: row.get("shift_duration_seconds")?,
        status,
        last_status_change: opt_ts_column(row, "last_status_change")?,
        created_at: opt_ts_column(row, "created_at")?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser, password_hash: &str) -> AppResult<i64> {
    let duration = shift_duration_seconds(user.shift_start_time, user.shift_end_time);

    conn.execute(
        "INSERT INTO users (username, name, department, email, password_hash, role,
                            shift_start_time, shift_end_time, shift_duration_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.username,
            user.name,
            user.department,
            user.email,
            password_hash,
            user.role.to_db_str(),
            format_shift_time(user.shift_start_time),
            format_shift_time(user.shift_end_time),
            duration,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, user_id: i64) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [user_id], map_user).optional()?)
}

/// Look a user up by username or email.
pub fn find_user_by_login(conn: &Connection, login: &str) -> AppResult<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE username = ?1 OR email = ?1 ORDER BY id LIMIT 1",
        USER_COLUMNS
    );
    Ok(conn.query_row(&sql, [login], map_user).optional()?)
}

/// List users ordered by name, optionally filtered on username/name/department.
pub fn list_users(conn: &Connection, search: Option<&str>) -> AppResult<Vec<User>> {
    let mut out = Vec::new();

    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let like = format!("%{}%", term);
            let sql = format!(
                "SELECT {} FROM users
                 WHERE username LIKE ?1 OR name LIKE ?1 OR department LIKE ?1
                 ORDER BY name",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            for r in stmt.query_map([like], map_user)? {
                out.push(r?);
            }
        }
        None => {
            let sql = format!("SELECT {} FROM users ORDER BY name", USER_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            for r in stmt.query_map([], map_user)? {
                out.push(r?);
            }
        }
    }

    Ok(out)
}

/// Set the current status. Returns the number of rows touched (0 or 1).
pub fn update_status(
    conn: &Connection,
    user_id: i64,
    status: UserStatus,
    at: DateTime<Utc>,
) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE users SET status = ?1, last_status_change = ?2 WHERE id = ?3",
        params![status.to_db_str(), format_ts(at), user_id],
    )?;
    Ok(n)
}

/// Apply an administrative profile update.
///
/// Only the fields that are set are written. Touching either shift time
/// recomputes `shift_duration_seconds` from the resulting start/end pair.
pub fn admin_update_user(conn: &Connection, user_id: i64, update: &UserUpdate) -> AppResult<()> {
    if update.is_empty() {
        return Ok(());
    }

    let mut cols: Vec<&str> = Vec::new();
    let mut vals: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(v) = &update.username {
        cols.push("username");
        vals.push(Box::new(v.clone()));
    }
    if let Some(v) = &update.name {
        cols.push("name");
        vals.push(Box::new(v.clone()));
    }
    if let Some(v) = &update.department {
        cols.push("department");
        vals.push(Box::new(v.clone()));
    }
    if let Some(v) = &update.email {
        cols.push("email");
        vals.push(Box::new(v.clone()));
    }
    if let Some(v) = update.role {
        cols.push("role");
        vals.push(Box::new(v.to_db_str()));
    }

    if update.touches_shift() {
        let current = get_user(conn, user_id)?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;
        let start = update.shift_start_time.unwrap_or(current.shift_start_time);
        let end = update.shift_end_time.unwrap_or(current.shift_end_time);

        cols.push("shift_start_time");
        vals.push(Box::new(format_shift_time(start)));
        cols.push("shift_end_time");
        vals.push(Box::new(format_shift_time(end)));
        cols.push("shift_duration_seconds");
        vals.push(Box::new(shift_duration_seconds(start, end)));
    }

    let assignments: Vec<String> = cols
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c, i + 1))
        .collect();
    let sql = format!(
        "UPDATE users SET {} WHERE id = ?{}",
        assignments.join(", "),
        cols.len() + 1
    );
    vals.push(Box::new(user_id));

    let n = conn.execute(&sql, rusqlite::params_from_iter(vals.iter()))?;
    if n == 0 {
        return Err(AppError::NotFound(format!("user {}", user_id)));
    }
    Ok(())
}

/// Delete a user. Events, overtime and media rows go with it (FK cascade).
pub fn admin_delete_user(conn: &Connection, user_id: i64) -> AppResult<bool> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
    Ok(n > 0)
}

/// Every non-blank email belonging to an admin. An empty list is a valid answer.
pub fn list_admin_emails(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT email FROM users
         WHERE role = 'admin' AND email IS NOT NULL AND TRIM(email) <> ''
         ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;

    let mut out = Vec::new();
    for r in rows {
        if let Some(email) = r? {
            out.push(email.trim().to_string());
        }
    }
    Ok(out)
}
