//! Value conversions between the client's value model and SQLite's native values

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest integer magnitude an `f64` represents exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// How a native 64-bit integer is represented when decoded from a result row.
///
/// Encoding is unaffected by the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntMode {
    /// Exact `f64`; integers beyond ±(2^53 - 1) fail to decode
    #[default]
    Number,
    /// Exact integer, always succeeds
    BigInt,
    /// Base-10 digit string, always succeeds
    String,
}

impl fmt::Display for IntMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntMode::Number => "number",
            IntMode::BigInt => "bigint",
            IntMode::String => "string",
        })
    }
}

impl FromStr for IntMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "number" => Ok(IntMode::Number),
            "bigint" => Ok(IntMode::BigInt),
            "string" => Ok(IntMode::String),
            other => Err(format!("invalid int mode '{}', expected one of number, bigint, string", other)),
        }
    }
}

/// A value passed as a statement argument or read from a result column.
///
/// `Boolean` and `Timestamp` only exist on the way in: they are stored as integers and
/// come back as integers. `Undefined` stands for a missing value and is always rejected
/// as an argument; pass `Null` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    /// Integer wider than 64 bits so out of range inputs can be represented (and rejected)
    BigInt(i128),
    Text(String),
    /// Read-only view over the blob bytes; clones share the buffer
    Blob(Bytes),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Undefined,
}

impl Value {
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(i) => i64::try_from(*i).ok(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to a native SQLite value for binding
    pub fn to_sql(&self) -> Result<SqlValue> {
        match self {
            Value::Null => Ok(SqlValue::Null),
            Value::Number(n) if !n.is_finite() => Err(Error::NonFiniteNumber(*n)),
            Value::Number(n) => Ok(SqlValue::Real(*n)),
            Value::BigInt(i) => i64::try_from(*i).map(SqlValue::Integer).map_err(|_| Error::IntegerOutOfRange(*i)),
            Value::Text(s) => Ok(SqlValue::Text(s.clone())),
            Value::Blob(b) => Ok(SqlValue::Blob(b.to_vec())),
            Value::Boolean(b) => Ok(SqlValue::Integer(if *b { 1 } else { 0 })),
            Value::Timestamp(ts) => Ok(SqlValue::Integer(ts.timestamp_millis())),
            Value::Undefined => Err(Error::UndefinedArgument),
        }
    }

    /// Convert a native SQLite column value, rendering integers according to `int_mode`.
    ///
    /// Text that is not valid UTF-8 fails with a decode error rather than being altered.
    pub fn from_sql(value: ValueRef<'_>, int_mode: IntMode) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(Value::Null),
            ValueRef::Integer(i) => decode_integer(i, int_mode),
            ValueRef::Real(f) => Ok(Value::Number(f)),
            ValueRef::Text(t) => std::str::from_utf8(t).map(|s| Value::Text(s.to_owned())).map_err(Error::InvalidUtf8),
            ValueRef::Blob(b) => Ok(Value::Blob(Bytes::copy_from_slice(b))),
        }
    }
}

fn decode_integer(i: i64, int_mode: IntMode) -> Result<Value> {
    match int_mode {
        IntMode::Number if i.unsigned_abs() > MAX_SAFE_INTEGER as u64 => Err(Error::UnsafeInteger(i)),
        IntMode::Number => Ok(Value::Number(i as f64)),
        IntMode::BigInt => Ok(Value::BigInt(i as i128)),
        IntMode::String => Ok(Value::Text(i.to_string())),
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            // JSON numbers can't carry 64-bit integers exactly
            Value::BigInt(i) => serializer.collect_str(i),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => b.serialize(serializer),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Timestamp(ts) => serializer.serialize_i64(ts.timestamp_millis()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Number(v) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::BigInt(v as i128) }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::BigInt(v as i128) }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self { Value::BigInt(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Boolean(v) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Value::Text(v) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Text(v.to_string()) }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self { Value::Blob(Bytes::from(v)) }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self { Value::Blob(Bytes::copy_from_slice(v)) }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self { Value::Blob(v) }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self { Value::Timestamp(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Build a positional argument list: `args![1, "text", true]`
#[macro_export]
macro_rules! args {
    ($($val:expr),* $(,)?) => {
        vec![$($crate::Value::from($val)),*]
    };
}
