//! Base exporter - maps one Airtable base onto one SQLite database.
//!
//! Phases run strictly in order: load schema, create metadata tables, build
//! entity and link tables, apply foreign keys, insert settings, ingest records.

mod entities;
mod foreign_keys;
mod ingest;
mod metadata;

pub use entities::{entity_table_def, link_table_def, link_table_name, TableBuilder};
pub use foreign_keys::PendingForeignKeys;
pub use ingest::{ingest_table, IngestStats};
pub use metadata::{meta_table, MetaTable, META_TABLES};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::model::BaseRecord;
use crate::core::naming::NamingPreference;
use crate::core::traits::{Destination, SchemaSource};
use crate::core::value::{Batch, SqlValue};
use crate::error::Result;
use crate::source::{load_schema, BaseSchema};

use metadata::META_SETTINGS;

/// Exports a single base.
pub struct BaseExporter {
    source: Arc<dyn SchemaSource>,
    destination: Arc<dyn Destination>,
    base: BaseRecord,
    naming: NamingPreference,
    schema: BaseSchema,
    pending: PendingForeignKeys,
    counts: Counts,
}

#[derive(Debug, Default)]
struct Counts {
    fields: usize,
    link_tables: usize,
    foreign_keys: usize,
    records: u64,
    link_rows: u64,
}

/// Result of exporting one base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    /// Base id.
    pub base_id: String,

    /// Base name.
    pub base_name: String,

    /// Naming preference used for tables and columns.
    pub naming: NamingPreference,

    /// When the export started.
    pub started_at: DateTime<Utc>,

    /// When the export completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Entity tables created.
    pub tables: usize,

    /// Fields recorded in `_meta_field`.
    pub fields: usize,

    /// Junction tables created for link fields.
    pub link_tables: usize,

    /// Foreign keys applied.
    pub foreign_keys: usize,

    /// Records written to entity tables.
    pub records: u64,

    /// Rows written to junction tables.
    pub link_rows: u64,
}

impl BaseExporter {
    /// Create an exporter for `base`, writing into `destination`.
    pub fn new(
        source: Arc<dyn SchemaSource>,
        destination: Arc<dyn Destination>,
        base: BaseRecord,
        naming: NamingPreference,
    ) -> Self {
        Self {
            source,
            destination,
            base,
            naming,
            schema: BaseSchema::default(),
            pending: PendingForeignKeys::new(),
            counts: Counts::default(),
        }
    }

    pub fn base(&self) -> &BaseRecord {
        &self.base
    }

    pub fn naming(&self) -> NamingPreference {
        self.naming
    }

    /// Loaded schema; empty until [`load_schema`](Self::load_schema) ran.
    pub fn schema(&self) -> &BaseSchema {
        &self.schema
    }

    /// Foreign keys registered but not yet applied.
    pub fn pending_foreign_keys(&self) -> &PendingForeignKeys {
        &self.pending
    }

    /// Run every phase in order.
    pub async fn run(mut self) -> Result<ExportResult> {
        let started_at = Utc::now();
        info!("Exporting base {} ({})", self.base.name, self.base.id);

        info!("Phase 1: Fetching schema");
        self.load_schema().await?;

        info!("Phase 2: Creating metadata tables");
        self.create_metadata_tables().await?;

        info!("Phase 3: Creating tables");
        self.create_all_table_metadata().await?;

        info!("Phase 4: Adding foreign keys");
        self.create_foreign_keys().await?;

        info!("Phase 5: Recording settings");
        self.insert_settings().await?;

        info!("Phase 6: Fetching table data");
        self.insert_all_table_data().await?;

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let result = ExportResult {
            base_id: self.base.id.clone(),
            base_name: self.base.name.clone(),
            naming: self.naming,
            started_at,
            completed_at,
            duration_seconds: duration,
            tables: self.schema.tables.len(),
            fields: self.counts.fields,
            link_tables: self.counts.link_tables,
            foreign_keys: self.counts.foreign_keys,
            records: self.counts.records,
            link_rows: self.counts.link_rows,
        };

        info!(
            "Exported base {}: {} tables, {} records, {} link rows in {:.1}s",
            result.base_id,
            result.tables,
            result.records,
            result.link_rows,
            result.duration_seconds
        );

        Ok(result)
    }

    /// Fetch the base schema and build the table id lookup.
    pub async fn load_schema(&mut self) -> Result<()> {
        self.schema = load_schema(self.source.as_ref(), &self.base, self.naming).await?;
        Ok(())
    }

    /// Create the five metadata tables and register their foreign keys.
    pub async fn create_metadata_tables(&mut self) -> Result<()> {
        for table in &META_TABLES {
            debug!("Creating metadata table {}", table.name);
            self.destination.create_table(&table.table_def()).await?;
            self.pending.extend(table.foreign_keys());
        }
        Ok(())
    }

    /// Build metadata rows, entity tables and junction tables for every table.
    pub async fn create_all_table_metadata(&mut self) -> Result<()> {
        let builder = TableBuilder::new(self.destination.as_ref(), &self.schema, self.naming);
        for table in &self.schema.tables {
            let stats = builder.build(table, &mut self.pending).await?;
            self.counts.fields += stats.fields;
            self.counts.link_tables += stats.link_tables;
        }
        Ok(())
    }

    /// Apply every pending foreign key.
    pub async fn create_foreign_keys(&mut self) -> Result<()> {
        self.counts.foreign_keys += self.pending.apply(self.destination.as_ref()).await?;
        Ok(())
    }

    /// Record base identity and naming preference in `_meta_settings`.
    pub async fn insert_settings(&mut self) -> Result<()> {
        let mut settings = Batch::new(["key", "value"]);
        for (key, value) in [
            ("base_id", self.base.id.as_str()),
            ("base_name", self.base.name.as_str()),
            ("permissionLevel", self.base.permission_level.as_str()),
            ("prefer_ids", self.naming.as_str()),
        ] {
            settings.push(vec![SqlValue::from(key), SqlValue::from(value)]);
        }
        self.destination.insert_batch(META_SETTINGS, &settings).await?;
        Ok(())
    }

    /// Stream and write the records of every table.
    pub async fn insert_all_table_data(&mut self) -> Result<()> {
        for table in &self.schema.tables {
            let stats = ingest_table(
                self.source.as_ref(),
                self.destination.as_ref(),
                &self.base.id,
                table,
                self.naming,
            )
            .await?;
            self.counts.records += stats.records;
            self.counts.link_rows += stats.link_rows;
        }
        Ok(())
    }
}

impl ExportResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
