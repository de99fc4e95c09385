//! # airtable-to-sqlite
//!
//! Export Airtable bases into SQLite databases.
//!
//! Each base becomes one database containing:
//!
//! - **Metadata tables** (`_meta_table`, `_meta_field`, `_meta_field_choice`,
//!   `_meta_view`, `_meta_settings`) describing the base schema
//! - **Entity tables**, one per Airtable table, keyed by record id
//! - **Junction tables**, one per link field, holding record-to-record pairs
//! - **Foreign keys** tying all of the above together
//!
//! Tables and columns are named after Airtable names, or ids with
//! [`NamingPreference::Id`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use airtable_to_sqlite::{select_bases, AirtableClient, BaseExporter, Config, SqliteDestination};
//!
//! #[tokio::main]
//! async fn main() -> airtable_to_sqlite::Result<()> {
//!     let config = Config::load("airtable.yaml")?;
//!     config.validate()?;
//!
//!     let client = Arc::new(AirtableClient::new(&config.personal_access_token, &config.api_url)?);
//!     for base in select_bases(client.as_ref(), config.requested_bases()).await? {
//!         let dest = Arc::new(SqliteDestination::create(config.output_path(&base)).await?);
//!         let result = BaseExporter::new(client.clone(), dest, base, config.naming()).run().await?;
//!         println!("Exported {} records", result.records);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use crate::config::Config;
pub use crate::core::{
    BaseRecord, Destination, FieldSchema, ForeignKey, NamingPreference, Record, SchemaSource,
    TableSchema,
};
pub use error::{ExportError, Result};
pub use orchestrator::{BaseExporter, ExportResult, PendingForeignKeys};
pub use source::{load_schema, select_bases, AirtableClient, BaseSchema};
pub use target::SqliteDestination;
