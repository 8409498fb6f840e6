//! Result rows and result sets

use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::value::Value;

/// Column names shared by every row of one result set
#[derive(Debug)]
pub(crate) struct Columns {
    names: Vec<String>,
    /// First occurrence wins for duplicate names
    lookup: HashMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(names: Vec<String>) -> Arc<Self> {
        let mut lookup = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            lookup.entry(name.clone()).or_insert(i);
        }
        Arc::new(Self { names, lookup })
    }
}

/// One result row, addressable by position and by column name.
///
/// Both views read the same values. When a result has duplicate column names,
/// lookup by name resolves to the first column with that name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Columns>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Columns>, values: Vec<Value>) -> Self { Self { columns, values } }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Value> { self.values.get(index) }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> { self.columns.lookup.get(name).and_then(|&i| self.values.get(i)) }

    pub fn columns(&self) -> &[String] { &self.columns.names }

    pub fn values(&self) -> &[Value] { &self.values }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> { self.columns.names.iter().map(String::as_str).zip(self.values.iter()) }

    pub fn into_values(self) -> Vec<Value> { self.values }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value { &self.values[index] }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.get_by_name(name) {
            Some(value) => value,
            None => panic!("no column named '{}'", name),
        }
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool { self.columns.names == other.columns.names && self.values == other.values }
}

/// Serializes as an object keyed by column name; duplicate names keep the first value
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.lookup.len()))?;
        for (i, (name, value)) in self.iter().enumerate() {
            if self.columns.lookup.get(name) == Some(&i) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// The outcome of one statement.
///
/// Row-producing statements fill `columns`, `column_types` and `rows`, with `rows_affected`
/// zero and no `last_insert_rowid`. Other statements leave those empty and report what the
/// engine changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    /// Declared column types; empty string for expressions
    pub column_types: Vec<String>,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub last_insert_rowid: Option<i64>,
}

impl ResultSet {
    pub(crate) fn rows(columns: Vec<String>, column_types: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, column_types, rows, rows_affected: 0, last_insert_rowid: None }
    }

    pub(crate) fn mutation(rows_affected: u64, last_insert_rowid: i64) -> Self {
        Self { rows_affected, last_insert_rowid: Some(last_insert_rowid), ..Default::default() }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // serializing plain values into a serde_json::Value can't fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResultSet", 5)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("columnTypes", &self.column_types)?;
        state.serialize_field("rows", &self.rows)?;
        state.serialize_field("rowsAffected", &self.rows_affected)?;
        state.serialize_field("lastInsertRowid", &self.last_insert_rowid.map(|id| id.to_string()))?;
        state.end()
    }
}
