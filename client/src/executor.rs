//! Runs one statement against an open handle

use std::collections::HashMap;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use tracing::debug;

use crate::error::{Error, Result};
use crate::result::{Columns, ResultSet, Row};
use crate::statement::{strip_sigil, Arguments, Statement};
use crate::value::{IntMode, Value};

/// Arguments after encoding, ready to bind
enum Encoded {
    Positional(Vec<SqlValue>),
    Named(HashMap<String, SqlValue>),
}

fn encode_arguments(args: &Arguments) -> Result<Encoded> {
    match args {
        Arguments::None => Ok(Encoded::Positional(Vec::new())),
        Arguments::Positional(values) => values.iter().map(Value::to_sql).collect::<Result<Vec<_>>>().map(Encoded::Positional),
        Arguments::Named(values) => {
            let mut encoded = HashMap::with_capacity(values.len());
            for (name, value) in values {
                let key = strip_sigil(name);
                if encoded.insert(key.to_string(), value.to_sql()?).is_some() {
                    return Err(Error::DuplicateNamedArgument(key.to_string()));
                }
            }
            Ok(Encoded::Named(encoded))
        }
    }
}

/// True if `sql` holds nothing but whitespace, comments and semicolons
fn is_blank(sql: &str) -> bool {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(comment) = rest.strip_prefix("--") {
            rest = comment.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(comment) = rest.strip_prefix("/*") {
            // SQLite accepts an unterminated block comment running to the end of input
            rest = comment.split_once("*/").map_or("", |(_, after)| after);
        } else {
            return rest.is_empty();
        }
    }
}

fn bind_arguments(stmt: &mut rusqlite::Statement<'_>, args: Encoded) -> Result<()> {
    let expected = stmt.parameter_count();
    match args {
        Encoded::Positional(values) => {
            if values.len() != expected {
                return Err(Error::ArgumentCount { expected, given: values.len() });
            }
            for (i, value) in values.into_iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, value)?;
            }
        }
        Encoded::Named(values) => {
            // names are collected up front since binding needs the statement mutably
            let names: Vec<Option<String>> = (1..=expected).map(|i| stmt.parameter_name(i).map(str::to_owned)).collect();
            for (i, name) in names.into_iter().enumerate() {
                let index = i + 1;
                let key = match &name {
                    Some(name) => strip_sigil(name).to_string(),
                    None => format!("?{}", index),
                };
                // `:id`, `@id` and `$id` are distinct parameters to SQLite but share one argument
                let value = values.get(&key).cloned().ok_or_else(|| Error::MissingNamedArgument(key.clone()))?;
                stmt.raw_bind_parameter(index, value)?;
            }
        }
    }
    Ok(())
}

/// Execute one statement on `conn`, decoding result integers per `int_mode`.
///
/// Arguments are encoded before the engine sees the statement, so argument errors never
/// reach SQLite. Whether the statement produces rows is decided by its column count rather
/// than by attempting a row fetch.
pub(crate) fn execute_stmt(conn: &Connection, stmt: &Statement, int_mode: IntMode) -> Result<ResultSet> {
    if is_blank(&stmt.sql) {
        return Err(Error::EmptyStatement);
    }
    let args = encode_arguments(&stmt.args)?;

    debug!("execute: {}", stmt.sql);
    let mut prepared = conn.prepare(&stmt.sql)?;
    bind_arguments(&mut prepared, args)?;

    let column_count = prepared.column_count();
    if column_count == 0 {
        let changes = prepared.raw_execute()?;
        return Ok(ResultSet::mutation(changes as u64, conn.last_insert_rowid()));
    }

    let names: Vec<String> = prepared.column_names().into_iter().map(String::from).collect();
    let column_types: Vec<String> = prepared.columns().iter().map(|c| c.decl_type().unwrap_or("").to_string()).collect();
    let columns = Columns::new(names.clone());

    let mut rows = Vec::new();
    let mut cursor = prepared.raw_query();
    while let Some(row) = cursor.next()? {
        let values = (0..column_count).map(|i| Value::from_sql(row.get_ref(i)?, int_mode)).collect::<Result<Vec<_>>>()?;
        rows.push(Row::new(columns.clone(), values));
    }

    Ok(ResultSet::rows(names, column_types, rows))
}

/// Run an unparameterized, possibly multi-statement script
pub(crate) fn execute_script(conn: &Connection, sql: &str) -> Result<()> {
    debug!("execute_multiple: {}", sql);
    conn.execute_batch(sql)?;
    Ok(())
}
