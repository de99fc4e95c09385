//! SQL value types for writing Airtable data into SQLite.
//!
//! Airtable hands back loosely typed JSON; [`SqlValue`] is the small closed set
//! of values SQLite stores natively, and [`Batch`] groups rows for one bulk
//! insert.

use serde_json::Value;

/// SQL value written to a destination column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL.
    Null,

    /// Boolean value (stored as 0/1).
    Bool(bool),

    /// 64-bit signed integer.
    Integer(i64),

    /// Double precision float.
    Real(f64),

    /// Text.
    Text(String),
}

impl SqlValue {
    /// Convert a raw Airtable JSON value.
    ///
    /// Scalars map onto their SQLite counterpart; arrays and objects
    /// (multi-selects, attachments, collaborators, lookups) are stored as JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
        }
    }

    /// Convert an optional JSON value; a missing value is NULL.
    pub fn from_json_opt(value: Option<&Value>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::from_json)
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Rows destined for one table, all sharing the same column list.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Column names, in row order.
    pub columns: Vec<String>,

    /// Rows; each has exactly `columns.len()` values.
    pub rows: Vec<Vec<SqlValue>>,
}

impl Batch {
    /// Create an empty batch for the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<SqlValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Get the number of rows in this batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
