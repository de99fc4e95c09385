//! Core traits separating the mapping engine from its collaborators.
//!
//! - [`SchemaSource`]: lists bases, fetches a base schema and streams records
//! - [`Destination`]: creates tables, adds foreign keys and bulk-inserts rows
//!
//! The engine in [`crate::orchestrator`] only talks to these traits, so it can
//! be driven by the Airtable HTTP client in production and by canned fixtures
//! in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

use super::model::{BaseRecord, Record, TableSchema};
use super::schema::{ColumnInfo, ForeignKey, TableDef};
use super::value::Batch;

/// Pages of records for one table.
///
/// Lazy, finite and not restartable: each page is fetched when polled.
pub type RecordPages<'a> = BoxStream<'a, Result<Vec<Record>>>;

/// Read schema and records from the remote service.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// List every base visible to the credential, in source order.
    async fn list_bases(&self) -> Result<Vec<BaseRecord>>;

    /// Fetch the tables of a base with their fields and views, in source order.
    async fn get_schema(&self, base_id: &str) -> Result<Vec<TableSchema>>;

    /// Stream the records of a table page by page.
    ///
    /// `table` is the table's name as Airtable knows it (ids are accepted too).
    fn stream_records<'a>(&'a self, base_id: &'a str, table: &'a str) -> RecordPages<'a>;
}

/// Write schema and data to the destination database.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Create a table with typed columns and an optional primary key.
    async fn create_table(&self, table: &TableDef) -> Result<()>;

    /// Add foreign key constraints to existing tables.
    ///
    /// Every key is validated before any table is changed; a key whose table,
    /// column, referenced table or referenced column does not exist, or that is
    /// already present, fails the whole call.
    async fn add_foreign_keys(&self, foreign_keys: &[ForeignKey]) -> Result<()>;

    /// Insert all rows of a batch. Returns the number of rows written.
    async fn insert_batch(&self, table: &str, batch: &Batch) -> Result<u64>;

    /// Names of all existing tables.
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Columns of a table, in declaration order.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Foreign keys declared on a table.
    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>>;

    /// Check if a table exists.
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.table_names().await?.iter().any(|t| t == table))
    }

    /// Close the underlying connection.
    async fn close(&self);
}
