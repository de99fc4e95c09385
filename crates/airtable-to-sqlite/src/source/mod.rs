//! Schema source: the Airtable client plus base selection and schema loading.

mod airtable;
#[cfg(test)]
pub(crate) mod fixture;

pub use airtable::{api_error_message, AirtableClient, DEFAULT_API_URL};

use std::collections::HashMap;

use tracing::{debug, info};

use crate::core::model::{BaseRecord, TableSchema};
use crate::core::naming::NamingPreference;
use crate::core::traits::SchemaSource;
use crate::error::{ExportError, Result};

/// Loaded schema of one base.
#[derive(Debug, Clone, Default)]
pub struct BaseSchema {
    /// Tables in source order.
    pub tables: Vec<TableSchema>,
    /// Table id to display name under the run's naming preference.
    pub table_names: HashMap<String, String>,
}

impl BaseSchema {
    /// Display name of a table by id.
    pub fn table_name(&self, table_id: &str) -> Option<&str> {
        self.table_names.get(table_id).map(String::as_str)
    }
}

/// Resolve the bases to export.
///
/// With no filter every base is returned. Otherwise each requested id must be
/// visible to the token; all missing ids are reported together. The result
/// keeps the listing order.
pub async fn select_bases(
    source: &dyn SchemaSource,
    requested: Option<&[String]>,
) -> Result<Vec<BaseRecord>> {
    let bases = source.list_bases().await?;

    let Some(requested) = requested.filter(|ids| !ids.is_empty()) else {
        info!("Selected all {} bases", bases.len());
        return Ok(bases);
    };

    let missing: Vec<&String> = requested
        .iter()
        .filter(|id| !bases.iter().any(|b| &b.id == *id))
        .collect();
    if !missing.is_empty() {
        return Err(ExportError::base_not_found(missing));
    }

    let selected: Vec<BaseRecord> = bases
        .into_iter()
        .filter(|b| requested.contains(&b.id))
        .collect();
    info!("Selected {} of the requested bases", selected.len());
    Ok(selected)
}

/// Fetch a base schema and build its table id lookup.
pub async fn load_schema(
    source: &dyn SchemaSource,
    base: &BaseRecord,
    naming: NamingPreference,
) -> Result<BaseSchema> {
    let tables = source.get_schema(&base.id).await?;

    let table_names = tables
        .iter()
        .map(|t| (t.id.clone(), naming.resolve(t).to_string()))
        .collect();

    for table in &tables {
        debug!(
            "Table {} ({}): {} fields, {} views",
            table.name,
            table.id,
            table.fields.len(),
            table.views.len()
        );
    }
    info!("Loaded {} tables for base {}", tables.len(), base.id);

    Ok(BaseSchema {
        tables,
        table_names,
    })
}
