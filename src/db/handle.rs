//! SQLite connection handle.
//!
//! Each operation opens its own connection and drops it when done; there is
//! no pooling and no state shared between invocations.

use crate::errors::AppResult;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub struct DbHandle {
    pub conn: Connection,
}

impl DbHandle {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        configure(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        Ok(Self { conn })
    }

    /// Helper to execute a closure with a mutable connection reference.
    pub fn with_conn<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T>,
    {
        func(&mut self.conn)
    }
}

/// Cascades and set-null links are declared in the schema; SQLite only
/// honours them with `foreign_keys` switched on per connection.
fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}
