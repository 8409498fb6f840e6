//! Statements accepted by the client: plain SQL, or SQL with positional or named arguments

use std::collections::HashMap;

use crate::value::Value;

/// Arguments bound to a statement's parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Arguments {
    #[default]
    None,
    /// Bound by position, first value to parameter 1
    Positional(Vec<Value>),
    /// Bound by parameter name. Keys may carry an `@`, `$` or `:` sigil, which is stripped when
    /// binding; two keys that differ only by sigil are rejected.
    Named(HashMap<String, Value>),
}

impl Arguments {
    pub fn is_empty(&self) -> bool {
        match self {
            Arguments::None => true,
            Arguments::Positional(values) => values.is_empty(),
            Arguments::Named(values) => values.is_empty(),
        }
    }
}

/// A SQL statement together with its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Arguments,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self { Self { sql: sql.into(), args: Arguments::None } }

    pub fn with_args(sql: impl Into<String>, args: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self { sql: sql.into(), args: Arguments::Positional(args.into_iter().map(Into::into).collect()) }
    }

    /// Statement with named arguments. `"@id"`, `"$id"`, `":id"` and `"id"` all bind to parameter `id`.
    pub fn named<K, V>(sql: impl Into<String>, args: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let args = args.into_iter().map(|(k, v)| (k.as_ref().to_string(), v.into())).collect();
        Self { sql: sql.into(), args: Arguments::Named(args) }
    }
}

/// Strip a single leading parameter sigil (`@`, `$` or `:`)
pub fn strip_sigil(name: &str) -> &str { name.strip_prefix(['@', '$', ':']).unwrap_or(name) }

impl From<&str> for Statement {
    fn from(sql: &str) -> Self { Statement::new(sql) }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self { Statement::new(sql) }
}

impl From<&String> for Statement {
    fn from(sql: &String) -> Self { Statement::new(sql.as_str()) }
}

impl<S: Into<String>> From<(S, Vec<Value>)> for Statement {
    fn from((sql, args): (S, Vec<Value>)) -> Self { Statement { sql: sql.into(), args: Arguments::Positional(args) } }
}

impl<S: Into<String>> From<(S, HashMap<String, Value>)> for Statement {
    fn from((sql, args): (S, HashMap<String, Value>)) -> Self { Statement { sql: sql.into(), args: Arguments::Named(args) } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_sigil() {
        assert_eq!(strip_sigil("@id"), "id");
        assert_eq!(strip_sigil("$id"), "id");
        assert_eq!(strip_sigil(":id"), "id");
        assert_eq!(strip_sigil("id"), "id");
        // only one sigil is removed
        assert_eq!(strip_sigil("::id"), ":id");
    }

    #[test]
    fn test_named_keys_kept_as_given() {
        let stmt = Statement::named("SELECT :id", [("@id", 5)]);
        let Arguments::Named(args) = &stmt.args else { panic!("expected named arguments") };
        assert_eq!(args.get("@id"), Some(&Value::BigInt(5)));
        assert_eq!(args.get("id"), None);
    }

    #[test]
    fn test_statement_shapes() {
        let plain: Statement = "SELECT 1".into();
        assert!(plain.args.is_empty());

        let positional: Statement = ("SELECT ?", vec![Value::from(1)]).into();
        assert_eq!(positional.args, Arguments::Positional(vec![Value::BigInt(1)]));

        let with_args = Statement::with_args("SELECT ?, ?", [1, 2]);
        assert_eq!(with_args.args, Arguments::Positional(vec![Value::BigInt(1), Value::BigInt(2)]));
    }
}
