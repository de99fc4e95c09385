//! Destination schema types: tables, columns and foreign keys as SQLite sees them.

use std::fmt;

/// Column type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Free text, JSON-encoded compound values.
    Text,
    /// Numbers, percentages, currency amounts, counts.
    Real,
    /// Checkboxes, stored as 0/1.
    Boolean,
    /// Creation timestamps, stored verbatim as the source ISO-8601 string.
    Timestamp,
}

impl ColumnType {
    /// Declared SQLite type used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Timestamp => "TEXT",
            ColumnType::Real => "FLOAT",
            ColumnType::Boolean => "INTEGER",
        }
    }
}

/// Column definition for table creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,

    /// Column type.
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }
}

/// Table definition for table creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name.
    pub name: String,

    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,

    /// Primary key column names (empty for junction tables).
    pub primary_key: Vec<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
        }
    }

    /// Set the primary key columns.
    pub fn with_primary_key<S: Into<String>>(mut self, pk: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = pk.into_iter().map(Into::into).collect();
        self
    }

    /// Check if the table has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// A single-column foreign key constraint.
///
/// Ordered so that a set of pending keys is applied deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForeignKey {
    /// Owning table.
    pub table: String,

    /// Column in the owning table.
    pub column: String,

    /// Referenced table.
    pub other_table: String,

    /// Referenced column.
    pub other_column: String,
}

impl ForeignKey {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        other_table: impl Into<String>,
        other_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            other_table: other_table.into(),
            other_column: other_column.into(),
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} => {}.{}",
            self.table, self.column, self.other_table, self.other_column
        )
    }
}

/// Column metadata as reported by the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Declared type (e.g., "TEXT", "FLOAT").
    pub data_type: String,

    /// Whether the column is part of the primary key.
    pub is_pk: bool,
}
