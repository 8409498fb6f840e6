//! The client: standalone statements, batches and interactive transactions

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rusqlite::Connection;
use tracing::debug;

use crate::connection::ClientConfig;
use crate::error::{Error, Result};
use crate::executor::{execute_script, execute_stmt};
use crate::result::ResultSet;
use crate::statement::Statement;
use crate::transaction::{run_batch, RollbackGuard, Transaction, TransactionMode};
use crate::value::IntMode;

/// Client for one SQLite database file.
///
/// Every standalone call opens its own handle, uses it for that call only and closes it
/// before returning, so calls never contend over a shared handle. A [`Transaction`] keeps
/// one handle for its whole lifetime instead.
#[derive(Debug)]
pub struct Client {
    config: Arc<ClientConfig>,
    closed: AtomicBool,
}

impl Client {
    /// Create a client, checking that the database can be opened
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config);
        client.with_handle(|_| Ok(())).await?;
        Ok(client)
    }

    /// Create a client for the database file at `path` with default settings
    pub async fn open_file(path: impl Into<PathBuf>) -> Result<Self> { Self::open(ClientConfig::file(path)).await }

    /// Create a client without touching the database
    pub fn new(config: ClientConfig) -> Self { Self { config: Arc::new(config), closed: AtomicBool::new(false) } }

    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn int_mode(&self) -> IntMode { self.config.int_mode }

    /// Close the client. Subsequent calls fail with `CLIENT_CLOSED` without touching the database.
    ///
    /// Transactions created earlier own their handle and are unaffected.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Client for {} closed", self.config.path.display());
        }
    }

    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ClientClosed);
        }
        Ok(())
    }

    /// Open a fresh handle on the blocking pool, run `f` with it, and close it on every exit path
    async fn with_handle<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.check_open()?;
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let conn = config.open_handle()?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
    }

    /// Execute a single statement
    pub async fn execute(&self, stmt: impl Into<Statement>) -> Result<ResultSet> {
        let stmt = stmt.into();
        let int_mode = self.int_mode();
        self.with_handle(move |conn| execute_stmt(conn, &stmt, int_mode)).await
    }

    /// Execute `stmts` in one transaction. Either every statement commits or the first failure
    /// rolls the whole batch back.
    pub async fn batch<I>(&self, stmts: I, mode: TransactionMode) -> Result<Vec<ResultSet>>
    where
        I: IntoIterator,
        I::Item: Into<Statement>,
    {
        let stmts: Vec<Statement> = stmts.into_iter().map(Into::into).collect();
        let int_mode = self.int_mode();
        self.with_handle(move |conn| run_batch(conn, &stmts, mode, int_mode)).await
    }

    /// Apply schema migrations: a deferred batch with foreign key enforcement switched off
    pub async fn migrate<I>(&self, stmts: I) -> Result<Vec<ResultSet>>
    where
        I: IntoIterator,
        I::Item: Into<Statement>,
    {
        let stmts: Vec<Statement> = stmts.into_iter().map(Into::into).collect();
        let int_mode = self.int_mode();
        self.with_handle(move |conn| {
            // has no effect inside a transaction, so it goes first; the handle is discarded afterwards
            execute_script(conn, "PRAGMA foreign_keys = OFF")?;
            run_batch(conn, &stmts, TransactionMode::Deferred, int_mode)
        })
        .await
    }

    /// Start an interactive transaction on a dedicated handle
    pub async fn transaction(&self, mode: TransactionMode) -> Result<Transaction> {
        let int_mode = self.int_mode();
        self.check_open()?;
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let conn = config.open_handle()?;
            Transaction::begin(conn, mode, int_mode)
        })
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
    }

    /// Execute a script of semicolon separated statements without arguments or results.
    ///
    /// A transaction the script leaves open is rolled back.
    pub async fn execute_multiple(&self, sql: impl Into<String>) -> Result<()> {
        let sql = sql.into();
        self.with_handle(move |conn| {
            let _guard = RollbackGuard(conn);
            execute_script(conn, &sql)
        })
        .await
    }
}
