//! Fixed metadata tables describing the exported base.

use crate::core::model::KNOWN_OPTION_FIELDS;
use crate::core::schema::{ColumnDef, ColumnType, ForeignKey, TableDef};

pub const META_TABLE: &str = "_meta_table";
pub const META_FIELD: &str = "_meta_field";
pub const META_FIELD_CHOICE: &str = "_meta_field_choice";
pub const META_VIEW: &str = "_meta_view";
pub const META_SETTINGS: &str = "_meta_settings";

/// Foreign key declared by a metadata table: `column -> other_table.other_column`.
#[derive(Debug, Clone, Copy)]
pub struct MetaForeignKey {
    pub column: &'static str,
    pub other_table: &'static str,
    pub other_column: &'static str,
}

impl MetaForeignKey {
    const fn new(
        column: &'static str,
        other_table: &'static str,
        other_column: &'static str,
    ) -> Self {
        Self {
            column,
            other_table,
            other_column,
        }
    }
}

/// Static definition of a metadata table.
///
/// Columns are TEXT except those listed in `boolean_columns`.
#[derive(Debug, Clone, Copy)]
pub struct MetaTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub boolean_columns: &'static [&'static str],
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [MetaForeignKey],
}

impl MetaTable {
    /// Declared type of one of this table's columns.
    pub fn column_type(&self, column: &str) -> ColumnType {
        if self.boolean_columns.iter().any(|c| *c == column) {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }

    /// Table definition for creation.
    pub fn table_def(&self) -> TableDef {
        let columns = self
            .columns
            .iter()
            .map(|c| ColumnDef::new(*c, self.column_type(c)))
            .collect();
        TableDef::new(self.name, columns).with_primary_key(self.primary_key.iter().copied())
    }

    /// Declared foreign keys, owned by this table.
    pub fn foreign_keys(&self) -> impl Iterator<Item = ForeignKey> + '_ {
        self.foreign_keys
            .iter()
            .map(|fk| ForeignKey::new(self.name, fk.column, fk.other_table, fk.other_column))
    }
}

const FIELD_COLUMNS: [&str; 17] = [
    "id",
    "name",
    "type",
    "tableId",
    "options",
    KNOWN_OPTION_FIELDS[0],
    KNOWN_OPTION_FIELDS[1],
    KNOWN_OPTION_FIELDS[2],
    KNOWN_OPTION_FIELDS[3],
    KNOWN_OPTION_FIELDS[4],
    KNOWN_OPTION_FIELDS[5],
    KNOWN_OPTION_FIELDS[6],
    KNOWN_OPTION_FIELDS[7],
    KNOWN_OPTION_FIELDS[8],
    KNOWN_OPTION_FIELDS[9],
    KNOWN_OPTION_FIELDS[10],
    KNOWN_OPTION_FIELDS[11],
];

/// Known options holding booleans.
const BOOLEAN_OPTION_FIELDS: [&str; 3] = ["isReversed", "prefersSingleRecordLink", "isValid"];

pub static META_TABLES: [MetaTable; 5] = [
    MetaTable {
        name: META_TABLE,
        columns: &["id", "name", "primaryFieldId"],
        boolean_columns: &[],
        primary_key: &["id"],
        foreign_keys: &[MetaForeignKey::new("primaryFieldId", META_FIELD, "id")],
    },
    MetaTable {
        name: META_FIELD,
        columns: &FIELD_COLUMNS,
        boolean_columns: &BOOLEAN_OPTION_FIELDS,
        primary_key: &["id", "tableId"],
        foreign_keys: &[
            MetaForeignKey::new("tableId", META_TABLE, "id"),
            MetaForeignKey::new("linkedTableId", META_TABLE, "id"),
            MetaForeignKey::new("inverseLinkFieldId", META_FIELD, "id"),
            MetaForeignKey::new("recordLinkFieldId", META_TABLE, "id"),
        ],
    },
    MetaTable {
        name: META_FIELD_CHOICE,
        columns: &["id", "name", "color", "fieldId"],
        boolean_columns: &[],
        primary_key: &["id", "fieldId"],
        foreign_keys: &[MetaForeignKey::new("fieldId", META_FIELD, "id")],
    },
    MetaTable {
        name: META_VIEW,
        columns: &["id", "name", "type", "tableId"],
        boolean_columns: &[],
        primary_key: &["id", "tableId"],
        foreign_keys: &[MetaForeignKey::new("tableId", META_TABLE, "id")],
    },
    MetaTable {
        name: META_SETTINGS,
        columns: &["key", "value"],
        boolean_columns: &[],
        primary_key: &["key"],
        foreign_keys: &[],
    },
];

/// Look up a metadata table by name.
pub fn meta_table(name: &str) -> Option<&'static MetaTable> {
    META_TABLES.iter().find(|t| t.name == name)
}
