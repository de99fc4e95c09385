//! Entity and link table construction for one source table.

use tracing::{debug, info, warn};

use crate::core::model::{FieldSchema, TableSchema};
use crate::core::naming::NamingPreference;
use crate::core::schema::{ColumnDef, ColumnType, ForeignKey, TableDef};
use crate::core::traits::Destination;
use crate::core::typemap::column_type;
use crate::core::value::{Batch, SqlValue};
use crate::error::Result;
use crate::source::BaseSchema;

use super::foreign_keys::PendingForeignKeys;
use super::metadata::{
    meta_table, MetaTable, META_FIELD, META_FIELD_CHOICE, META_TABLE, META_VIEW,
};

pub const ID_COLUMN: &str = "_id";
pub const CREATED_TIME_COLUMN: &str = "_createdTime";
pub const RECORD_ID_COLUMN: &str = "recordId";
pub const OTHER_RECORD_ID_COLUMN: &str = "otherRecordId";

/// Junction table name for a link field: `<table display name>_<field id>`.
pub fn link_table_name(table_name: &str, field_id: &str) -> String {
    format!("{}_{}", table_name, field_id)
}

/// Linked table id of a link field that gets a junction table.
pub fn link_target(field: &FieldSchema) -> Option<&str> {
    if field.is_link() {
        field.linked_table_id()
    } else {
        None
    }
}

/// Entity table: `_id` primary key, `_createdTime`, one column per non-link field.
pub fn entity_table_def(table: &TableSchema, naming: NamingPreference) -> TableDef {
    let mut columns = vec![
        ColumnDef::text(ID_COLUMN),
        ColumnDef::new(CREATED_TIME_COLUMN, ColumnType::Timestamp),
    ];
    columns.extend(table.fields.iter().filter_map(|field| {
        column_type(field).map(|ty| ColumnDef::new(naming.resolve(field), ty))
    }));

    TableDef::new(naming.resolve(table), columns).with_primary_key([ID_COLUMN])
}

/// Junction table with two TEXT columns and no primary key.
pub fn link_table_def(name: &str) -> TableDef {
    TableDef::new(
        name,
        vec![
            ColumnDef::text(RECORD_ID_COLUMN),
            ColumnDef::text(OTHER_RECORD_ID_COLUMN),
        ],
    )
}

fn meta_batch(name: &str) -> Batch {
    let columns = meta_table(name).map(|t: &MetaTable| t.columns).unwrap_or(&[]);
    Batch::new(columns.iter().copied())
}

/// Counts of what one table contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableBuildStats {
    pub fields: usize,
    pub choices: usize,
    pub link_tables: usize,
}

/// Builds metadata rows, the entity table and junction tables of a source table.
pub struct TableBuilder<'a> {
    destination: &'a dyn Destination,
    schema: &'a BaseSchema,
    naming: NamingPreference,
}

impl<'a> TableBuilder<'a> {
    pub fn new(
        destination: &'a dyn Destination,
        schema: &'a BaseSchema,
        naming: NamingPreference,
    ) -> Self {
        Self {
            destination,
            schema,
            naming,
        }
    }

    /// Materialize one table, registering implied foreign keys in `pending`.
    pub async fn build(
        &self,
        table: &TableSchema,
        pending: &mut PendingForeignKeys,
    ) -> Result<TableBuildStats> {
        let table_name = self.naming.resolve(table);
        let mut stats = TableBuildStats::default();

        let mut table_row = meta_batch(META_TABLE);
        table_row.push(vec![
            SqlValue::from(table.id.as_str()),
            SqlValue::from(table.name.as_str()),
            SqlValue::from(table.primary_field_id.as_str()),
        ]);
        self.destination.insert_batch(META_TABLE, &table_row).await?;

        let mut field_rows = meta_batch(META_FIELD);
        for field in &table.fields {
            if let Some(choices) = field.choices() {
                if !choices.is_empty() {
                    let mut batch = meta_batch(META_FIELD_CHOICE);
                    for choice in &choices {
                        batch.push(vec![
                            choice.id.clone().into(),
                            choice.name.clone().into(),
                            choice.color.clone().into(),
                            SqlValue::from(choice.field_id.as_str()),
                        ]);
                    }
                    self.destination
                        .insert_batch(META_FIELD_CHOICE, &batch)
                        .await?;
                    stats.choices += choices.len();
                }
            }

            field_rows.push(field.for_insertion(table).into_values());

            if field.is_link() {
                self.create_link_table(table_name, field, pending).await?;
                if link_target(field).is_some() {
                    stats.link_tables += 1;
                }
            }
        }
        stats.fields = field_rows.len();
        if !field_rows.is_empty() {
            self.destination.insert_batch(META_FIELD, &field_rows).await?;
        }

        let entity = entity_table_def(table, self.naming);
        debug!(
            "Creating table {} with {} columns",
            entity.name,
            entity.columns.len()
        );
        self.destination.create_table(&entity).await?;

        if !table.views.is_empty() {
            let mut views = meta_batch(META_VIEW);
            for view in &table.views {
                views.push(vec![
                    SqlValue::from(view.id.as_str()),
                    SqlValue::from(view.name.as_str()),
                    SqlValue::from(view.view_type.as_str()),
                    SqlValue::from(table.id.as_str()),
                ]);
            }
            self.destination.insert_batch(META_VIEW, &views).await?;
        }

        info!(
            "Created table {} ({} fields, {} link tables)",
            table_name, stats.fields, stats.link_tables
        );
        Ok(stats)
    }

    async fn create_link_table(
        &self,
        table_name: &str,
        field: &FieldSchema,
        pending: &mut PendingForeignKeys,
    ) -> Result<()> {
        let Some(linked_id) = link_target(field) else {
            warn!(
                "Link field {} ({}) on {} has no linked table, skipping junction table",
                field.name, field.id, table_name
            );
            return Ok(());
        };

        let other_table = match self.schema.table_name(linked_id) {
            Some(name) => name,
            None => {
                warn!(
                    "Linked table {} of field {} is not part of this base, using its id",
                    linked_id, field.id
                );
                linked_id
            }
        };

        let name = link_table_name(table_name, &field.id);
        debug!("Creating link table {} -> {}", name, other_table);
        self.destination.create_table(&link_table_def(&name)).await?;

        pending.add(ForeignKey::new(&name, RECORD_ID_COLUMN, table_name, ID_COLUMN));
        pending.add(ForeignKey::new(
            &name,
            OTHER_RECORD_ID_COLUMN,
            other_table,
            ID_COLUMN,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixture::sample_schema;
    use serde_json::json;

    #[test]
    fn test_link_table_name() {
        assert_eq!(
            link_table_name("My Table", "fld123456789D"),
            "My Table_fld123456789D"
        );
    }

    #[test]
    fn test_entity_table_def_by_name() {
        let tables = sample_schema();
        let def = entity_table_def(&tables[0], NamingPreference::Name);
        assert_eq!(def.name, "My Table");
        let columns: Vec<_> = def.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            columns,
            vec!["_id", "_createdTime", "Name", "Spec", "IP Address"]
        );
        assert_eq!(def.primary_key, vec!["_id".to_string()]);
        assert_eq!(def.columns[1].column_type, ColumnType::Timestamp);
    }

    #[test]
    fn test_entity_table_def_by_id() {
        let tables = sample_schema();
        let def = entity_table_def(&tables[0], NamingPreference::Id);
        assert_eq!(def.name, "tbl123");
        assert!(def.has_column("fld123456789C"));
        assert!(!def.has_column("fld123456789D"));
        assert_eq!(def.columns.len(), 5);
    }

    #[test]
    fn test_link_target() {
        let tables = sample_schema();
        assert_eq!(link_target(&tables[0].fields[3]), Some("tbl124"));
        assert_eq!(link_target(&tables[0].fields[0]), None);

        let field: FieldSchema = serde_json::from_value(json!({
            "type": "multipleRecordLinks", "id": "fldX", "name": "Broken", "options": {}
        }))
        .unwrap();
        assert_eq!(link_target(&field), None);
    }
}
