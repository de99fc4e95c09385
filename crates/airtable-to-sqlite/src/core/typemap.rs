//! Type mapping from Airtable field types to SQLite column types.

use super::model::{FieldSchema, FORMULA_FIELD_TYPE, LINK_FIELD_TYPE};
use super::schema::ColumnType;

/// Airtable field types stored as floating point numbers.
pub const NUMBER_FIELD_TYPES: [&str; 4] = ["number", "percent", "currency", "count"];

/// Map an Airtable field to its entity-table column type.
///
/// Formula fields take the type of their declared result. Link fields have no
/// column (`None`); they are materialized as junction tables instead.
pub fn column_type(field: &FieldSchema) -> Option<ColumnType> {
    let mut field_type = field.field_type.as_str();
    if field_type == FORMULA_FIELD_TYPE {
        if let Some(result) = field.result_type() {
            field_type = result;
        }
    }
    map_type(field_type)
}

/// Map a raw Airtable type tag.
pub fn map_type(field_type: &str) -> Option<ColumnType> {
    match field_type {
        LINK_FIELD_TYPE => None,
        t if NUMBER_FIELD_TYPES.contains(&t) => Some(ColumnType::Real),
        "checkbox" => Some(ColumnType::Boolean),
        _ => Some(ColumnType::Text),
    }
}
