//! Record ingestion: entity rows plus junction rows for link fields.

use futures::TryStreamExt;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::model::{FieldSchema, Record, TableSchema};
use crate::core::naming::NamingPreference;
use crate::core::traits::{Destination, SchemaSource};
use crate::core::typemap::column_type;
use crate::core::value::{Batch, SqlValue};
use crate::error::Result;

use super::entities::{
    link_table_name, link_target, CREATED_TIME_COLUMN, ID_COLUMN, OTHER_RECORD_ID_COLUMN,
    RECORD_ID_COLUMN,
};

/// Rows written for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub records: u64,
    pub link_rows: u64,
}

struct LinkRows<'t> {
    field_name: &'t str,
    table: String,
    batch: Batch,
}

/// Accumulates the rows of one table while its record pages stream in.
struct TableRows<'t> {
    /// Fields with an entity column, in column order.
    fields: Vec<&'t FieldSchema>,
    entity: Batch,
    links: Vec<LinkRows<'t>>,
}

impl<'t> TableRows<'t> {
    fn new(table: &'t TableSchema, naming: NamingPreference) -> Self {
        let table_name = naming.resolve(table);

        let fields: Vec<_> = table
            .fields
            .iter()
            .filter(|f| column_type(f).is_some())
            .collect();
        let mut columns = vec![ID_COLUMN.to_string(), CREATED_TIME_COLUMN.to_string()];
        columns.extend(fields.iter().map(|f| naming.resolve(*f).to_string()));

        let links = table
            .fields
            .iter()
            .filter(|f| link_target(f).is_some())
            .map(|f| LinkRows {
                field_name: f.name.as_str(),
                table: link_table_name(table_name, &f.id),
                batch: Batch::new([RECORD_ID_COLUMN, OTHER_RECORD_ID_COLUMN]),
            })
            .collect();

        Self {
            fields,
            entity: Batch::new(columns),
            links,
        }
    }

    fn push(&mut self, record: &Record) {
        let mut row = Vec::with_capacity(self.entity.columns.len());
        row.push(SqlValue::from(record.id.as_str()));
        row.push(SqlValue::from(record.created_time.as_str()));

        // record fields are keyed by field name regardless of naming preference
        for field in &self.fields {
            row.push(SqlValue::from_json_opt(record.fields.get(&field.name)));
        }
        self.entity.push(row);

        for link in &mut self.links {
            for other in linked_ids(record.fields.get(link.field_name)) {
                link.batch.push(vec![SqlValue::from(record.id.as_str()), other]);
            }
        }
    }
}

/// Linked record ids held by a link field value; absent or null means none.
fn linked_ids(value: Option<&Value>) -> Vec<SqlValue> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(SqlValue::from_json).collect(),
        Some(other) => vec![SqlValue::from_json(other)],
    }
}

/// Stream every record of `table` and write its entity and junction rows.
pub async fn ingest_table(
    source: &dyn SchemaSource,
    destination: &dyn Destination,
    base_id: &str,
    table: &TableSchema,
    naming: NamingPreference,
) -> Result<IngestStats> {
    info!("Fetching table data for {}", table.name);

    let mut rows = TableRows::new(table, naming);
    let mut pages = source.stream_records(base_id, &table.name);
    while let Some(page) = pages.try_next().await? {
        debug!("Received page of {} records for {}", page.len(), table.name);
        for record in &page {
            rows.push(record);
        }
    }

    let mut stats = IngestStats::default();
    let table_name = naming.resolve(table);
    if !rows.entity.is_empty() {
        stats.records = destination.insert_batch(table_name, &rows.entity).await?;
    }
    for link in &rows.links {
        if !link.batch.is_empty() {
            stats.link_rows += destination.insert_batch(&link.table, &link.batch).await?;
        }
    }

    info!(
        "Inserted {} records and {} link rows into {}",
        stats.records, stats.link_rows, table_name
    );
    Ok(stats)
}
