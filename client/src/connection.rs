//! Client configuration and opening of database handles

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::value::IntMode;

/// Configuration for a [`Client`](crate::Client)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path of the database file
    pub path: PathBuf,
    /// How integers are decoded from result rows
    pub int_mode: IntMode,
    /// Open handles read-only
    pub read_only: bool,
    /// Create the database file if it does not exist (ignored when `read_only`)
    pub create: bool,
    /// Enforce foreign key constraints on every handle
    pub foreign_keys: bool,
    /// How long a handle waits on a locked database before failing with `SQLITE_BUSY`
    pub busy_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { path: PathBuf::new(), int_mode: IntMode::Number, read_only: false, create: true, foreign_keys: true, busy_timeout_ms: 5000 }
    }
}

impl ClientConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self { Self { path: path.into(), ..Default::default() } }

    pub fn int_mode(mut self, int_mode: IntMode) -> Self {
        self.int_mode = int_mode;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    fn open_flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
        if self.read_only {
            base | OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE
        }
    }

    /// Open a fresh handle on the database file.
    ///
    /// Every handle is independent; dropping it closes it and rolls back any transaction it left open.
    pub(crate) fn open_handle(&self) -> Result<Connection> {
        debug!("Opening handle on {}", self.path.display());
        let conn = Connection::open_with_flags(&self.path, self.open_flags())?;
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)?;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_json() {
        let config: ClientConfig = serde_json::from_str(r#"{ "path": "app.db", "int_mode": "bigint" }"#).unwrap();
        assert_eq!(config.path, PathBuf::from("app.db"));
        assert_eq!(config.int_mode, IntMode::BigInt);
        assert!(config.create);
        assert!(config.foreign_keys);
        assert!(!config.read_only);
    }

    #[test]
    fn test_open_handle_applies_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::file(dir.path().join("pragma.db"));
        let conn = config.open_handle().unwrap();
        let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_open_missing_file_without_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig { create: false, ..ClientConfig::file(dir.path().join("absent.db")) };
        let err = config.open_handle().unwrap_err();
        assert_eq!(err.code(), Some("SQLITE_CANTOPEN"));
    }
}
