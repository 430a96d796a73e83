//! Scalar bind/result values and the dynamic result row.

use crate::errors::{StoreError, StoreResult};

/// A scalar value crossing the execution interface, in either direction.
///
/// Structured record fields never appear here directly; they are
/// serialized to their text encoding before binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Variant name, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// One fetched (or about-to-be-written) row: column name → value, kept in
/// result-set / declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value of `name`, or `None` when the column is absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get_i64(&self, name: &str) -> StoreResult<i64> {
        match self.require(name)? {
            Value::Int(v) => Ok(*v),
            other => Err(self.mismatch(name, other, "integer")),
        }
    }

    /// Float accessor; integer storage classes widen (engines with real
    /// column affinity may hand integral values back as integers).
    pub fn get_f64(&self, name: &str) -> StoreResult<f64> {
        match self.require(name)? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(self.mismatch(name, other, "float")),
        }
    }

    /// Bool accessor; single-bit columns come back as 0/1 integers.
    pub fn get_bool(&self, name: &str) -> StoreResult<bool> {
        match self.require(name)? {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => Err(self.mismatch(name, other, "bool")),
        }
    }

    pub fn get_str(&self, name: &str) -> StoreResult<&str> {
        match self.require(name)? {
            Value::Text(v) => Ok(v.as_str()),
            other => Err(self.mismatch(name, other, "text")),
        }
    }

    fn require(&self, name: &str) -> StoreResult<&Value> {
        self.get(name).ok_or_else(|| StoreError::MissingColumn {
            column: name.to_string(),
        })
    }

    fn mismatch(&self, name: &str, found: &Value, expected: &'static str) -> StoreError {
        StoreError::ColumnType {
            column: name.to_string(),
            found: found.type_name(),
            expected,
        }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        let mut row = Row::new();
        row.push("id", Value::Int(7));
        row.push("score", Value::Float(0.5));
        row.push("name", Value::Text("alice".to_string()));
        row.push("active", Value::Int(1));
        row
    }

    #[test]
    fn typed_accessors() {
        let row = sample();
        assert_eq!(row.get_i64("id").unwrap(), 7);
        assert_eq!(row.get_f64("score").unwrap(), 0.5);
        assert_eq!(row.get_str("name").unwrap(), "alice");
        assert!(row.get_bool("active").unwrap());
    }

    #[test]
    fn float_widens_from_integer() {
        let row = sample();
        assert_eq!(row.get_f64("id").unwrap(), 7.0);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = sample().get_i64("absent").unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { .. }));
    }

    #[test]
    fn type_mismatch_names_both_types() {
        let err = sample().get_i64("name").unwrap_err();
        match err {
            StoreError::ColumnType { found, expected, .. } => {
                assert_eq!(found, "text");
                assert_eq!(expected, "integer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn iteration_preserves_order() {
        let row = sample();
        let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["id", "score", "name", "active"]);
    }
}
