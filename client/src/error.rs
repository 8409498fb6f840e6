//! Error types for the SQLite client
//!
//! Engine failures are normalized into [`EngineError`] carrying a stable string code
//! (the SQLite result-code name, e.g. `SQLITE_CONSTRAINT_PRIMARYKEY`) together with
//! the original `rusqlite` cause. Lifecycle failures carry fixed codes produced by
//! the client itself. Argument and decode failures are raised before (or after) the
//! engine is involved and therefore have no engine code.

use rusqlite::ffi;
use thiserror::Error;

/// Code reported when operating on a closed [`Client`](crate::Client)
pub const CLIENT_CLOSED: &str = "CLIENT_CLOSED";
/// Code reported when operating on a committed, rolled back or closed [`Transaction`](crate::Transaction)
pub const TRANSACTION_CLOSED: &str = "TRANSACTION_CLOSED";
/// Code reported for engine failures that carry no SQLite result code
pub const UNKNOWN: &str = "UNKNOWN";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("The client is closed")]
    ClientClosed,

    #[error("The transaction is closed")]
    TransactionClosed,

    #[error("Only finite numbers (not Infinity or NaN) can be passed as arguments, got {0}")]
    NonFiniteNumber(f64),

    #[error("Integer {0} is too large to be represented as a 64-bit integer and passed as argument")]
    IntegerOutOfRange(i128),

    #[error("Undefined cannot be passed as argument to the database")]
    UndefinedArgument,

    #[error("Statement expects {expected} positional arguments, got {given}")]
    ArgumentCount { expected: usize, given: usize },

    #[error("Missing named argument '{0}'")]
    MissingNamedArgument(String),

    #[error("Named argument '{0}' is given more than once with different sigils")]
    DuplicateNamedArgument(String),

    #[error("Statement contains no SQL")]
    EmptyStatement,

    #[error("Received integer {0} which cannot be safely represented as a number")]
    UnsafeInteger(i64),

    #[error("Received text that is not valid UTF-8: {0}")]
    InvalidUtf8(std::str::Utf8Error),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client or transaction already closed; no engine call was made
    Lifecycle,
    /// An argument was rejected before reaching the engine
    Argument,
    /// The engine reported a failure
    Engine,
    /// A value returned by the engine is unrepresentable in the requested mode
    Decode,
    /// The blocking task running the engine call failed
    Runtime,
}

impl Error {
    /// Stable string code, if the error has one.
    ///
    /// Engine and lifecycle errors always have a code. Argument and decode errors do not,
    /// since they never reach the engine.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Engine(e) => Some(e.code()),
            Error::ClientClosed => Some(CLIENT_CLOSED),
            Error::TransactionClosed => Some(TRANSACTION_CLOSED),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Engine(_) => ErrorKind::Engine,
            Error::ClientClosed | Error::TransactionClosed => ErrorKind::Lifecycle,
            Error::NonFiniteNumber(_)
            | Error::IntegerOutOfRange(_)
            | Error::UndefinedArgument
            | Error::ArgumentCount { .. }
            | Error::MissingNamedArgument(_)
            | Error::DuplicateNamedArgument(_)
            | Error::EmptyStatement => ErrorKind::Argument,
            Error::UnsafeInteger(_) | Error::InvalidUtf8(_) => ErrorKind::Decode,
            Error::TaskJoin(_) => ErrorKind::Runtime,
        }
    }

    /// True for range failures (non-finite numbers, out of range integers on either side of the engine)
    pub fn is_range_error(&self) -> bool {
        matches!(self, Error::NonFiniteNumber(_) | Error::IntegerOutOfRange(_) | Error::UnsafeInteger(_))
    }

    /// True for type failures (the undefined sentinel passed as an argument)
    pub fn is_type_error(&self) -> bool { matches!(self, Error::UndefinedArgument) }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self { Error::Engine(EngineError::from(err)) }
}

/// A failure reported by SQLite, normalized to a stable code
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct EngineError {
    message: String,
    code: &'static str,
    raw_code: Option<i32>,
    #[source]
    source: rusqlite::Error,
}

impl EngineError {
    pub fn message(&self) -> &str { &self.message }

    pub fn code(&self) -> &'static str { self.code }

    /// Extended SQLite result code, when the failure came from SQLite itself
    pub fn raw_code(&self) -> Option<i32> { self.raw_code }

    pub fn cause(&self) -> &rusqlite::Error { &self.source }

    pub fn into_cause(self) -> rusqlite::Error { self.source }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let message = message.clone().unwrap_or_else(|| failure.to_string());
                EngineError { message, code: result_code_name(failure.extended_code), raw_code: Some(failure.extended_code), source: err }
            }
            _ => EngineError { message: err.to_string(), code: UNKNOWN, raw_code: None, source: err },
        }
    }
}

/// Map an (extended) SQLite result code to its symbolic name.
///
/// Extended codes are looked up first, falling back to the primary code in the low byte.
pub fn result_code_name(code: i32) -> &'static str {
    if let Some(name) = extended_code_name(code) {
        return name;
    }
    primary_code_name(code & 0xff).unwrap_or("SQLITE_UNKNOWN")
}

fn primary_code_name(code: i32) -> Option<&'static str> {
    Some(match code {
        ffi::SQLITE_OK => "SQLITE_OK",
        ffi::SQLITE_ERROR => "SQLITE_ERROR",
        ffi::SQLITE_INTERNAL => "SQLITE_INTERNAL",
        ffi::SQLITE_PERM => "SQLITE_PERM",
        ffi::SQLITE_ABORT => "SQLITE_ABORT",
        ffi::SQLITE_BUSY => "SQLITE_BUSY",
        ffi::SQLITE_LOCKED => "SQLITE_LOCKED",
        ffi::SQLITE_NOMEM => "SQLITE_NOMEM",
        ffi::SQLITE_READONLY => "SQLITE_READONLY",
        ffi::SQLITE_INTERRUPT => "SQLITE_INTERRUPT",
        ffi::SQLITE_IOERR => "SQLITE_IOERR",
        ffi::SQLITE_CORRUPT => "SQLITE_CORRUPT",
        ffi::SQLITE_NOTFOUND => "SQLITE_NOTFOUND",
        ffi::SQLITE_FULL => "SQLITE_FULL",
        ffi::SQLITE_CANTOPEN => "SQLITE_CANTOPEN",
        ffi::SQLITE_PROTOCOL => "SQLITE_PROTOCOL",
        ffi::SQLITE_EMPTY => "SQLITE_EMPTY",
        ffi::SQLITE_SCHEMA => "SQLITE_SCHEMA",
        ffi::SQLITE_TOOBIG => "SQLITE_TOOBIG",
        ffi::SQLITE_CONSTRAINT => "SQLITE_CONSTRAINT",
        ffi::SQLITE_MISMATCH => "SQLITE_MISMATCH",
        ffi::SQLITE_MISUSE => "SQLITE_MISUSE",
        ffi::SQLITE_NOLFS => "SQLITE_NOLFS",
        ffi::SQLITE_AUTH => "SQLITE_AUTH",
        ffi::SQLITE_FORMAT => "SQLITE_FORMAT",
        ffi::SQLITE_RANGE => "SQLITE_RANGE",
        ffi::SQLITE_NOTADB => "SQLITE_NOTADB",
        ffi::SQLITE_NOTICE => "SQLITE_NOTICE",
        ffi::SQLITE_WARNING => "SQLITE_WARNING",
        ffi::SQLITE_ROW => "SQLITE_ROW",
        ffi::SQLITE_DONE => "SQLITE_DONE",
        _ => return None,
    })
}

fn extended_code_name(code: i32) -> Option<&'static str> {
    Some(match code {
        ffi::SQLITE_ERROR_MISSING_COLLSEQ => "SQLITE_ERROR_MISSING_COLLSEQ",
        ffi::SQLITE_ERROR_RETRY => "SQLITE_ERROR_RETRY",
        ffi::SQLITE_ERROR_SNAPSHOT => "SQLITE_ERROR_SNAPSHOT",
        ffi::SQLITE_IOERR_READ => "SQLITE_IOERR_READ",
        ffi::SQLITE_IOERR_SHORT_READ => "SQLITE_IOERR_SHORT_READ",
        ffi::SQLITE_IOERR_WRITE => "SQLITE_IOERR_WRITE",
        ffi::SQLITE_IOERR_FSYNC => "SQLITE_IOERR_FSYNC",
        ffi::SQLITE_IOERR_DIR_FSYNC => "SQLITE_IOERR_DIR_FSYNC",
        ffi::SQLITE_IOERR_TRUNCATE => "SQLITE_IOERR_TRUNCATE",
        ffi::SQLITE_IOERR_FSTAT => "SQLITE_IOERR_FSTAT",
        ffi::SQLITE_IOERR_UNLOCK => "SQLITE_IOERR_UNLOCK",
        ffi::SQLITE_IOERR_RDLOCK => "SQLITE_IOERR_RDLOCK",
        ffi::SQLITE_IOERR_DELETE => "SQLITE_IOERR_DELETE",
        ffi::SQLITE_IOERR_NOMEM => "SQLITE_IOERR_NOMEM",
        ffi::SQLITE_IOERR_ACCESS => "SQLITE_IOERR_ACCESS",
        ffi::SQLITE_IOERR_LOCK => "SQLITE_IOERR_LOCK",
        ffi::SQLITE_IOERR_CLOSE => "SQLITE_IOERR_CLOSE",
        ffi::SQLITE_IOERR_SHMOPEN => "SQLITE_IOERR_SHMOPEN",
        ffi::SQLITE_IOERR_SHMSIZE => "SQLITE_IOERR_SHMSIZE",
        ffi::SQLITE_IOERR_SHMMAP => "SQLITE_IOERR_SHMMAP",
        ffi::SQLITE_IOERR_SEEK => "SQLITE_IOERR_SEEK",
        ffi::SQLITE_IOERR_DELETE_NOENT => "SQLITE_IOERR_DELETE_NOENT",
        ffi::SQLITE_IOERR_MMAP => "SQLITE_IOERR_MMAP",
        ffi::SQLITE_IOERR_GETTEMPPATH => "SQLITE_IOERR_GETTEMPPATH",
        ffi::SQLITE_LOCKED_SHAREDCACHE => "SQLITE_LOCKED_SHAREDCACHE",
        ffi::SQLITE_BUSY_RECOVERY => "SQLITE_BUSY_RECOVERY",
        ffi::SQLITE_BUSY_SNAPSHOT => "SQLITE_BUSY_SNAPSHOT",
        ffi::SQLITE_CANTOPEN_NOTEMPDIR => "SQLITE_CANTOPEN_NOTEMPDIR",
        ffi::SQLITE_CANTOPEN_ISDIR => "SQLITE_CANTOPEN_ISDIR",
        ffi::SQLITE_CANTOPEN_FULLPATH => "SQLITE_CANTOPEN_FULLPATH",
        ffi::SQLITE_CORRUPT_VTAB => "SQLITE_CORRUPT_VTAB",
        ffi::SQLITE_READONLY_RECOVERY => "SQLITE_READONLY_RECOVERY",
        ffi::SQLITE_READONLY_CANTLOCK => "SQLITE_READONLY_CANTLOCK",
        ffi::SQLITE_READONLY_ROLLBACK => "SQLITE_READONLY_ROLLBACK",
        ffi::SQLITE_READONLY_DBMOVED => "SQLITE_READONLY_DBMOVED",
        ffi::SQLITE_ABORT_ROLLBACK => "SQLITE_ABORT_ROLLBACK",
        ffi::SQLITE_CONSTRAINT_CHECK => "SQLITE_CONSTRAINT_CHECK",
        ffi::SQLITE_CONSTRAINT_COMMITHOOK => "SQLITE_CONSTRAINT_COMMITHOOK",
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => "SQLITE_CONSTRAINT_FOREIGNKEY",
        ffi::SQLITE_CONSTRAINT_FUNCTION => "SQLITE_CONSTRAINT_FUNCTION",
        ffi::SQLITE_CONSTRAINT_NOTNULL => "SQLITE_CONSTRAINT_NOTNULL",
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => "SQLITE_CONSTRAINT_PRIMARYKEY",
        ffi::SQLITE_CONSTRAINT_TRIGGER => "SQLITE_CONSTRAINT_TRIGGER",
        ffi::SQLITE_CONSTRAINT_UNIQUE => "SQLITE_CONSTRAINT_UNIQUE",
        ffi::SQLITE_CONSTRAINT_VTAB => "SQLITE_CONSTRAINT_VTAB",
        ffi::SQLITE_CONSTRAINT_ROWID => "SQLITE_CONSTRAINT_ROWID",
        ffi::SQLITE_NOTICE_RECOVER_WAL => "SQLITE_NOTICE_RECOVER_WAL",
        ffi::SQLITE_NOTICE_RECOVER_ROLLBACK => "SQLITE_NOTICE_RECOVER_ROLLBACK",
        ffi::SQLITE_WARNING_AUTOINDEX => "SQLITE_WARNING_AUTOINDEX",
        ffi::SQLITE_AUTH_USER => "SQLITE_AUTH_USER",
        _ => return None,
    })
}
