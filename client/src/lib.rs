//! SQLite client for a single database file
//!
//! Executes SQL statements against an embedded SQLite database and converts values between
//! the client's [`Value`] model and SQLite's native storage classes:
//!
//! - Integers decode according to an [`IntMode`]: as exact `f64` numbers (the default, failing
//!   for magnitudes above 2^53 - 1), as exact integers, or as decimal strings
//! - Booleans and timestamps are accepted as arguments and stored as integers
//! - Non-finite numbers, out of range integers and [`Value::Undefined`] are rejected before
//!   the statement reaches SQLite
//!
//! Standalone calls on [`Client`] each use their own short-lived handle. A [`Transaction`]
//! owns one handle until it is committed, rolled back or closed.
//!
//! Every failure is an [`Error`]; engine failures carry a stable code such as
//! `SQLITE_CONSTRAINT_PRIMARYKEY`, lifecycle failures carry `CLIENT_CLOSED` or
//! `TRANSACTION_CLOSED`.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlite_client::{args, Client, IntMode, ClientConfig, Statement, TransactionMode};
//!
//! # async fn example() -> sqlite_client::Result<()> {
//! let client = Client::open(ClientConfig::file("app.db").int_mode(IntMode::BigInt)).await?;
//! client.execute("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)").await?;
//! client.execute(("INSERT INTO users (name) VALUES (?)", args!["alice"])).await?;
//!
//! let rs = client.execute(Statement::named("SELECT * FROM users WHERE name = :name", [("name", "alice")])).await?;
//! println!("{}", rs.rows[0]["id"].as_i64().unwrap_or_default());
//!
//! let mut trx = client.transaction(TransactionMode::Write).await?;
//! trx.execute("DELETE FROM users").await?;
//! trx.rollback().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod connection;
pub mod error;
mod executor;
mod result;
mod statement;
mod transaction;
mod value;

pub use client::Client;
pub use connection::ClientConfig;
pub use error::{EngineError, Error, ErrorKind, Result};
pub use result::{ResultSet, Row};
pub use statement::{strip_sigil, Arguments, Statement};
pub use transaction::{Transaction, TransactionMode, TransactionState};
pub use value::{IntMode, Value, MAX_SAFE_INTEGER};
