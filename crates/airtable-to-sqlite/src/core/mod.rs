//! Core abstractions for the Airtable to SQLite mapping engine.
//!
//! - [`model`]: Airtable bases, tables, fields, views and records
//! - [`naming`]: display-name resolution by name or by id
//! - [`typemap`]: field type to column type mapping
//! - [`schema`]: destination table, column and foreign key types
//! - [`value`]: SQL values and insert batches
//! - [`identifier`]: SQLite identifier quoting
//! - [`traits`]: the source and destination seams

pub mod identifier;
pub mod model;
pub mod naming;
pub mod schema;
pub mod traits;
pub mod typemap;
pub mod value;

pub use model::{
    BaseRecord, ChoiceRecord, FieldRow, FieldSchema, Record, TableSchema, ViewSchema,
    KNOWN_OPTION_FIELDS, LINK_FIELD_TYPE,
};
pub use naming::{Named, NamingPreference};
pub use schema::{ColumnDef, ColumnInfo, ColumnType, ForeignKey, TableDef};
pub use traits::{Destination, RecordPages, SchemaSource};
pub use typemap::column_type;
pub use value::{Batch, SqlValue};
