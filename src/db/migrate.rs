use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists. It doubles as the migration ledger.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            username               TEXT NOT NULL UNIQUE,
            name                   TEXT NOT NULL,
            department             TEXT NOT NULL,
            email                  TEXT NOT NULL UNIQUE,
            password_hash          TEXT NOT NULL,
            role                   TEXT NOT NULL DEFAULT 'user' CHECK(role IN ('admin','user')),
            shift_start_time       TEXT NOT NULL DEFAULT '09:00:00',
            shift_duration_seconds INTEGER NOT NULL DEFAULT 32400,
            status                 TEXT NOT NULL DEFAULT 'off'
                                   CHECK(status IN ('off','shift_start','active','inactive')),
            last_status_change     TEXT NULL DEFAULT NULL,
            created_at             TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f000', 'now'))
        );
        "#,
    )?;
    Ok(())
}

fn create_activity_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS activity_events (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id                 INTEGER NOT NULL,
            event_type              TEXT NOT NULL CHECK(event_type IN ('shift_start','active','inactive')),
            occurred_at             TEXT NOT NULL,
            notified                INTEGER NOT NULL DEFAULT 0,
            active_duration_seconds INTEGER NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_events_pending ON activity_events(event_type, notified);
        CREATE INDEX IF NOT EXISTS idx_events_occurred ON activity_events(occurred_at);
        CREATE INDEX IF NOT EXISTS idx_events_user ON activity_events(user_id, occurred_at);

        CREATE TABLE IF NOT EXISTS screenshots (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id  INTEGER NOT NULL,
            event_id INTEGER NULL,
            taken_at TEXT NOT NULL,
            mime     TEXT NOT NULL DEFAULT 'image/png',
            url      TEXT,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (event_id) REFERENCES activity_events(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_screenshots_taken ON screenshots(taken_at);

        CREATE TABLE IF NOT EXISTS screen_recordings (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL,
            event_id         INTEGER NULL,
            recorded_at      TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL,
            mime             TEXT NOT NULL DEFAULT 'video/mp4',
            url              TEXT,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (event_id) REFERENCES activity_events(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recordings_recorded ON screen_recordings(recorded_at);

        CREATE TABLE IF NOT EXISTS user_overtimes (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL,
            ot_date          TEXT NOT NULL,
            overtime_seconds INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f000', 'now')),
            UNIQUE (user_id, ot_date),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_overtimes_date ON user_overtimes(ot_date);
        "#,
    )?;
    Ok(())
}

/// Check whether `table` has a column called `column`.
fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (strftime('%Y-%m-%d %H:%M:%f000', 'now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Older databases were created before shifts had an explicit end.
fn migrate_add_shift_end_time(conn: &Connection) -> Result<()> {
    let version = "20250301_0002_add_shift_end_time";

    if is_applied(conn, version)? {
        return Ok(());
    }

    if !has_column(conn, "users", "shift_end_time")? {
        conn.execute(
            "ALTER TABLE users ADD COLUMN shift_end_time TEXT NOT NULL DEFAULT '18:00:00'",
            [],
        )?;
        tracing::info!(version, "added shift_end_time to users");
    }

    mark_applied(conn, version, "Added shift_end_time to users")?;
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;
    create_users_table(conn)?;
    migrate_add_shift_end_time(conn)?;
    create_activity_tables(conn)?;
    Ok(())
}
