//! Interactive transactions over a single exclusively owned handle

use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::executor::{execute_script, execute_stmt};
use crate::result::ResultSet;
use crate::statement::Statement;
use crate::value::IntMode;

/// Locking behavior requested when a transaction begins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    /// Takes the write lock immediately (`BEGIN IMMEDIATE`)
    #[default]
    Write,
    /// Read-only; the handle rejects writes for the lifetime of the transaction
    Read,
    /// Takes locks lazily on first read or write (`BEGIN DEFERRED`)
    Deferred,
}

impl TransactionMode {
    fn begin_sql(self) -> &'static str {
        match self {
            TransactionMode::Write => "BEGIN IMMEDIATE",
            TransactionMode::Read | TransactionMode::Deferred => "BEGIN DEFERRED",
        }
    }
}

/// Issue the BEGIN for `mode` on `conn`
pub(crate) fn begin(conn: &Connection, mode: TransactionMode) -> Result<()> {
    if mode == TransactionMode::Read {
        // handles are never shared, so this can't leak into other callers
        conn.pragma_update(None, "query_only", true)?;
    }
    execute_script(conn, mode.begin_sql())
}

/// Rolls back a transaction still open on the handle when dropped
pub(crate) struct RollbackGuard<'a>(pub(crate) &'a Connection);

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if !self.0.is_autocommit() {
            debug!("Rolling back unfinished transaction");
            if let Err(e) = self.0.execute_batch("ROLLBACK") {
                warn!("Rollback failed: {}", e);
            }
        }
    }
}

/// Run `stmts` under one transaction: all commit, or the first failure aborts the lot
pub(crate) fn run_batch(conn: &Connection, stmts: &[Statement], mode: TransactionMode, int_mode: IntMode) -> Result<Vec<ResultSet>> {
    begin(conn, mode)?;
    let _guard = RollbackGuard(conn);
    let mut results = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        // a failed statement may have made SQLite roll back on its own
        if conn.is_autocommit() {
            return Err(Error::TransactionClosed);
        }
        results.push(execute_stmt(conn, stmt, int_mode)?);
    }
    execute_script(conn, "COMMIT")?;
    Ok(results)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
    /// Released without COMMIT or ROLLBACK; SQLite discarded the uncommitted work
    Closed,
}

/// An interactive transaction.
///
/// Owns its database handle from BEGIN until it is committed, rolled back or closed, after
/// which the handle is released and every further operation fails with `TRANSACTION_CLOSED`.
/// Before each operation the transaction checks that SQLite still reports an active
/// transaction, which also catches statements that made SQLite roll back on its own.
///
/// Operations take `&mut self`, so calls on one transaction are serialized by the borrow
/// checker. Dropping an unfinished transaction behaves like [`close`](Self::close).
pub struct Transaction {
    handle: Option<Connection>,
    int_mode: IntMode,
    state: TransactionState,
}

impl Transaction {
    /// Begin a transaction on a freshly opened handle, taking ownership of it
    pub(crate) fn begin(conn: Connection, mode: TransactionMode, int_mode: IntMode) -> Result<Self> {
        begin(&conn, mode)?;
        debug!("Transaction opened ({:?})", mode);
        Ok(Self { handle: Some(conn), int_mode, state: TransactionState::Open })
    }

    pub fn state(&self) -> TransactionState { self.state }

    /// True once the handle has been released
    pub fn is_closed(&self) -> bool { self.handle.is_none() }

    fn check_open(&self) -> Result<()> {
        match &self.handle {
            Some(conn) if !conn.is_autocommit() => Ok(()),
            _ => Err(Error::TransactionClosed),
        }
    }

    /// Run `f` with the handle on the blocking pool, then take the handle back
    async fn with_handle<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.check_open()?;
        let conn = self.handle.take().ok_or(Error::TransactionClosed)?;
        match tokio::task::spawn_blocking(move || {
            let result = f(&conn);
            (conn, result)
        })
        .await
        {
            Ok((conn, result)) => {
                self.handle = Some(conn);
                result
            }
            Err(e) => {
                // the handle went down with the task
                self.state = TransactionState::Closed;
                Err(Error::TaskJoin(e.to_string()))
            }
        }
    }

    pub async fn execute(&mut self, stmt: impl Into<Statement>) -> Result<ResultSet> {
        let stmt = stmt.into();
        let int_mode = self.int_mode;
        self.with_handle(move |conn| execute_stmt(conn, &stmt, int_mode)).await
    }

    /// Execute `stmts` in order, stopping at the first failure.
    ///
    /// Statements that succeeded before the failure stay part of the transaction unless
    /// SQLite rolled it back, in which case later calls fail with `TRANSACTION_CLOSED`.
    pub async fn batch<I>(&mut self, stmts: I) -> Result<Vec<ResultSet>>
    where
        I: IntoIterator,
        I::Item: Into<Statement>,
    {
        let stmts: Vec<Statement> = stmts.into_iter().map(Into::into).collect();
        let int_mode = self.int_mode;
        self.with_handle(move |conn| {
            let mut results = Vec::with_capacity(stmts.len());
            for stmt in &stmts {
                if conn.is_autocommit() {
                    return Err(Error::TransactionClosed);
                }
                results.push(execute_stmt(conn, stmt, int_mode)?);
            }
            Ok(results)
        })
        .await
    }

    pub async fn execute_multiple(&mut self, sql: impl Into<String>) -> Result<()> {
        let sql = sql.into();
        self.with_handle(move |conn| execute_script(conn, &sql)).await
    }

    /// Commit and release the handle. If COMMIT fails the transaction stays open.
    pub async fn commit(&mut self) -> Result<()> {
        self.with_handle(|conn| execute_script(conn, "COMMIT")).await?;
        self.release(TransactionState::Committed).await;
        Ok(())
    }

    /// Roll back and release the handle. A no-op once the handle has been released.
    ///
    /// The handle is released even if ROLLBACK fails.
    pub async fn rollback(&mut self) -> Result<()> {
        let Some(conn) = self.handle.take() else {
            return Ok(());
        };
        self.state = TransactionState::RolledBack;
        tokio::task::spawn_blocking(move || {
            let result = if conn.is_autocommit() { Ok(()) } else { execute_script(&conn, "ROLLBACK") };
            drop(conn);
            result
        })
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
    }

    /// Release the handle without issuing any SQL; SQLite discards uncommitted work
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            debug!("Transaction closed without commit or rollback");
            self.state = TransactionState::Closed;
        }
    }

    async fn release(&mut self, state: TransactionState) {
        self.state = state;
        if let Some(conn) = self.handle.take() {
            // closing may flush to disk
            if let Err(e) = tokio::task::spawn_blocking(move || drop(conn)).await {
                warn!("Failed to release handle: {}", e);
            }
        }
        debug!("Transaction finished ({:?})", state);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("Dropping open transaction, uncommitted work is discarded");
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction").field("state", &self.state).field("int_mode", &self.int_mode).finish_non_exhaustive()
    }
}
