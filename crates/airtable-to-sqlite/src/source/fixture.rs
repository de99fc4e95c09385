//! Canned schema source for tests.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use crate::core::model::{BaseRecord, Record, TableSchema};
use crate::core::traits::{RecordPages, SchemaSource};
use crate::error::{ExportError, Result};

pub(crate) fn sample_bases() -> Vec<BaseRecord> {
    serde_json::from_value(json!([
        {"id": "app123", "name": "Base 123", "permissionLevel": "create"},
        {"id": "app124", "name": "Base 124", "permissionLevel": "create"},
    ]))
    .unwrap()
}

pub(crate) fn sample_schema() -> Vec<TableSchema> {
    serde_json::from_value(json!([
        {
            "id": "tbl123",
            "name": "My Table",
            "primaryFieldId": "fld123456789A",
            "fields": [
                {"type": "singleLineText", "id": "fld123456789A", "name": "Name"},
                {
                    "type": "singleSelect",
                    "options": {
                        "choices": [
                            {"id": "sel123456789A", "name": "s-1vcpu-3gb", "color": "blueLight2"},
                            {"id": "sel123456789B", "name": "s-1vcpu-2gb", "color": "blueLight2"},
                            {"id": "sel123456789C", "name": "s-6vcpu-16gb", "color": "blueLight2"},
                            {"id": "sel123456789D", "name": "s-8vcpu-16gb", "color": "blueLight2"},
                        ]
                    },
                    "id": "fld123456789B",
                    "name": "Spec",
                },
                {"type": "singleLineText", "id": "fld123456789C", "name": "IP Address"},
                {
                    "type": "multipleRecordLinks",
                    "id": "fld123456789D",
                    "name": "Linked record",
                    "options": {"linkedTableId": "tbl124"},
                },
            ],
            "views": [{"id": "viw123456789", "name": "Grid view", "type": "grid"}],
        },
        {
            "id": "tbl124",
            "name": "My Other Table",
            "primaryFieldId": "fld123456799A",
            "fields": [
                {"type": "singleLineText", "id": "fld123456799A", "name": "Name"},
            ],
            "views": [{"id": "viw123456789A", "name": "Grid view", "type": "grid"}],
        },
    ]))
    .unwrap()
}

/// Two pages of two records; `rec123` links to two records.
pub(crate) fn sample_pages() -> Vec<Vec<Record>> {
    let record = |id: &str, fields: Value| -> Record {
        serde_json::from_value(json!({
            "id": id,
            "createdTime": "2021-01-01T00:00:00.000Z",
            "fields": fields,
        }))
        .unwrap()
    };

    vec![
        vec![
            record(
                "rec123",
                json!({"Name": "Test 3", "Number": 123, "Checkbox": true,
                       "Linked record": ["rec200", "rec201"]}),
            ),
            record("rec124", json!({"Name": "Test 4", "Number": 124, "Checkbox": true})),
        ],
        vec![
            record(
                "rec125",
                json!({"Name": "Test 5", "Spec": "s-1vcpu-3gb", "Linked record": []}),
            ),
            record("rec126", json!({"Name": "Test 6", "IP Address": "10.0.0.1"})),
        ],
    ]
}

/// Serves the same schema for every base and the same pages for every table.
pub(crate) struct FixtureSource {
    bases: Vec<BaseRecord>,
    tables: Vec<TableSchema>,
    pages: Vec<Vec<Record>>,
    failing: bool,
}

impl FixtureSource {
    pub(crate) fn new() -> Self {
        Self {
            bases: sample_bases(),
            tables: sample_schema(),
            pages: sample_pages(),
            failing: false,
        }
    }

    /// Lists bases but fails every schema and record request.
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub(crate) fn with_tables(tables: Vec<TableSchema>) -> Self {
        Self {
            tables,
            ..Self::new()
        }
    }

    pub(crate) fn base(&self, id: &str) -> BaseRecord {
        self.bases.iter().find(|b| b.id == id).cloned().unwrap()
    }

    fn unavailable() -> ExportError {
        ExportError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }
}

#[async_trait]
impl SchemaSource for FixtureSource {
    async fn list_bases(&self) -> Result<Vec<BaseRecord>> {
        Ok(self.bases.clone())
    }

    async fn get_schema(&self, _base_id: &str) -> Result<Vec<TableSchema>> {
        if self.failing {
            return Err(Self::unavailable());
        }
        Ok(self.tables.clone())
    }

    fn stream_records<'a>(&'a self, _base_id: &'a str, _table: &'a str) -> RecordPages<'a> {
        if self.failing {
            return stream::once(async { Err::<Vec<Record>, _>(Self::unavailable()) }).boxed();
        }
        stream::iter(self.pages.clone().into_iter().map(Ok::<_, ExportError>)).boxed()
    }
}
