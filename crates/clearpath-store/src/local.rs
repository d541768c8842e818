//! Local daemon state.
//!
//! A small SQLite key-value store in the data directory, holding exactly
//! two things: the last-login-type redirect hint and the persisted session
//! (so a daemon restart can resume it). This is the daemon-side analogue
//! of the browser's local storage.

use std::path::Path;

use rusqlite::Connection;

use clearpath_types::session::{LoginKind, Session};

use crate::{Result, StoreError};

const HINT_KEY: &str = "last_login_type";
const SESSION_KEY: &str = "session";

/// Local key-value state store.
pub struct LocalState {
    conn: Connection,
}

impl LocalState {
    /// Open or create the state database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory state database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             CREATE TABLE IF NOT EXISTS settings (
                 key TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        use rusqlite::OptionalExtension;
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StoreError::from)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }

    /// Record which portal the last successful sign-in went through.
    pub fn set_login_hint(&self, kind: LoginKind) -> Result<()> {
        self.set(HINT_KEY, kind.as_str())
    }

    /// The cached last-login hint, if any. Unknown stored values are
    /// discarded silently.
    pub fn login_hint(&self) -> Result<Option<LoginKind>> {
        Ok(self.get(HINT_KEY)?.as_deref().and_then(LoginKind::parse))
    }

    pub fn clear_login_hint(&self) -> Result<()> {
        self.remove(HINT_KEY)
    }

    /// Persist the session for restore-on-restart.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        self.set(SESSION_KEY, &json)
    }

    /// The persisted session, if one survives from a previous run. A
    /// corrupt entry is treated as absent.
    pub fn load_session(&self) -> Result<Option<Session>> {
        Ok(self
            .get(SESSION_KEY)?
            .and_then(|json| serde_json::from_str(&json).ok()))
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_KEY)
    }
}
