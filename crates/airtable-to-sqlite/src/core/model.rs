//! Airtable schema model: bases, tables, fields, choices, views and records.
//!
//! These types deserialize directly from the Airtable metadata and records
//! APIs and are read-only once loaded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::naming::Named;
use super::value::SqlValue;

/// Field type of link-to-records fields.
pub const LINK_FIELD_TYPE: &str = "multipleRecordLinks";

/// Field type whose column type depends on its declared result.
pub const FORMULA_FIELD_TYPE: &str = "formula";

/// Option keys promoted to their own `_meta_field` columns, in column order.
pub const KNOWN_OPTION_FIELDS: [&str; 12] = [
    "linkedTableId",
    "isReversed",
    "prefersSingleRecordLink",
    "inverseLinkFieldId",
    "isValid",
    "recordLinkFieldId",
    "icon",
    "color",
    "referencedFieldIds",
    "result",
    "precision",
    "symbol",
];

/// One base visible to the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseRecord {
    pub id: String,
    pub name: String,
    pub permission_level: String,
}

/// Table metadata with its fields and views, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    pub primary_field_id: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub views: Vec<ViewSchema>,
}

/// Field metadata. `options` is free-form and depends on `field_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// View metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: String,
}

/// One entry of a select field's choice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub field_id: String,
}

/// One record as returned by the records API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub created_time: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// `_meta_field` row for a field: known options promoted, the rest kept as a blob.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub id: String,
    pub name: String,
    pub field_type: String,
    pub table_id: String,
    /// Options left over after removing the known keys; `None` if the field had no options.
    pub options: Option<Map<String, Value>>,
    /// Values for [`KNOWN_OPTION_FIELDS`], index-aligned.
    pub known_options: [Option<Value>; 12],
}

impl FieldRow {
    /// Value extracted for a known option key.
    pub fn known_option(&self, key: &str) -> Option<&Value> {
        KNOWN_OPTION_FIELDS
            .iter()
            .position(|k| *k == key)
            .and_then(|idx| self.known_options[idx].as_ref())
    }

    /// Row values in `_meta_field` column order.
    pub fn into_values(self) -> Vec<SqlValue> {
        let mut values = Vec::with_capacity(5 + KNOWN_OPTION_FIELDS.len());
        values.push(SqlValue::Text(self.id));
        values.push(SqlValue::Text(self.name));
        values.push(SqlValue::Text(self.field_type));
        values.push(SqlValue::Text(self.table_id));
        values.push(
            self.options
                .map(|o| SqlValue::Text(Value::Object(o).to_string()))
                .unwrap_or(SqlValue::Null),
        );
        values.extend(
            self.known_options
                .iter()
                .map(|v| SqlValue::from_json_opt(v.as_ref())),
        );
        values
    }
}

impl FieldSchema {
    /// Check if this is a link-to-records field.
    pub fn is_link(&self) -> bool {
        self.field_type == LINK_FIELD_TYPE
    }

    /// Linked table id of a link field, if its options name one.
    pub fn linked_table_id(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|o| o.get("linkedTableId"))
            .and_then(Value::as_str)
    }

    /// Declared result type of a computed field (`options.result.type`).
    pub fn result_type(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|o| o.get("result"))
            .and_then(|r| r.get("type"))
            .and_then(Value::as_str)
    }

    /// Choices for `_meta_field_choice`.
    ///
    /// `None` when the field has no options at all, an empty list when the
    /// options carry no `choices` key.
    pub fn choices(&self) -> Option<Vec<ChoiceRecord>> {
        let options = self.options.as_ref()?;
        let choices = options
            .get("choices")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|choice| ChoiceRecord {
                        id: str_field(choice, "id"),
                        name: str_field(choice, "name"),
                        color: str_field(choice, "color"),
                        field_id: self.id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(choices)
    }

    /// Project this field into its `_meta_field` row.
    pub fn for_insertion(&self, table: &TableSchema) -> FieldRow {
        let mut options = self.options.clone();
        let known_options =
            KNOWN_OPTION_FIELDS.map(|key| options.as_mut().and_then(|o| o.remove(key)));

        FieldRow {
            id: self.id.clone(),
            name: self.name.clone(),
            field_type: self.field_type.clone(),
            table_id: table.id.clone(),
            options,
            known_options,
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

impl Named for BaseRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TableSchema {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for FieldSchema {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ViewSchema {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}
