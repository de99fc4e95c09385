//! Airtable Web API client.
//!
//! Implements the `SchemaSource` trait against the metadata and records
//! endpoints. Requests are not retried; any non-success status aborts the
//! caller with `ExportError::Api`.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::model::{BaseRecord, Record, TableSchema};
use crate::core::traits::{RecordPages, SchemaSource};
use crate::error::{ExportError, Result};

/// Default Airtable API root.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, Deserialize)]
struct BasesPage {
    bases: Vec<BaseRecord>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    tables: Vec<TableSchema>,
}

#[derive(Debug, Deserialize)]
struct RecordsPage {
    records: Vec<Record>,
    offset: Option<String>,
}

/// Airtable API client authenticated with a personal access token.
#[derive(Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_url: Url,
    token: String,
}

impl AirtableClient {
    /// Create a client for the given API root.
    pub fn new(token: impl Into<String>, api_url: &str) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| ExportError::Config(format!("Invalid API URL '{}': {}", api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(ExportError::Config(format!(
                "Invalid API URL '{}': not a base URL",
                api_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("airtable-to-sqlite/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url,
            token: token.into(),
        })
    }

    /// Build an endpoint URL from path segments (each segment is percent-encoded).
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a JSON document, optionally continuing from a pagination offset.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, offset: Option<&str>) -> Result<T> {
        let mut request = self.http.get(url.clone()).bearer_auth(&self.token);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        debug!("GET {} (offset: {:?})", url, offset);
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ExportError::Api {
                status: status.as_u16(),
                message: api_error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            })
        }
    }
}

/// Extract Airtable's error message from a response body.
///
/// Airtable reports errors either as `{"error": {"type": ..., "message": ...}}`
/// or as `{"error": "NOT_FOUND"}`.
pub fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::String(kind) => Some(kind.clone()),
        Value::Object(err) => {
            let message = err.get("message").and_then(Value::as_str);
            let kind = err.get("type").and_then(Value::as_str);
            match (kind, message) {
                (Some(kind), Some(message)) => Some(format!("{}: {}", kind, message)),
                (None, Some(message)) => Some(message.to_string()),
                (Some(kind), None) => Some(kind.to_string()),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

#[async_trait]
impl SchemaSource for AirtableClient {
    async fn list_bases(&self) -> Result<Vec<BaseRecord>> {
        info!("Fetching base records from Airtable...");
        let url = self.endpoint(&["meta", "bases"]);

        let mut bases = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let page: BasesPage = self.get_json(url.clone(), offset.as_deref()).await?;
            bases.extend(page.bases);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!("Found {} bases", bases.len());
        Ok(bases)
    }

    async fn get_schema(&self, base_id: &str) -> Result<Vec<TableSchema>> {
        info!("Fetching schema for base {} from Airtable...", base_id);
        let url = self.endpoint(&["meta", "bases", base_id, "tables"]);
        let schema: SchemaResponse = self.get_json(url, None).await?;
        Ok(schema.tables)
    }

    fn stream_records<'a>(&'a self, base_id: &'a str, table: &'a str) -> RecordPages<'a> {
        let url = self.endpoint(&[base_id, table]);

        // None: exhausted, Some(None): first page, Some(Some(offset)): next page
        let start: Option<Option<String>> = Some(None);
        stream::try_unfold(start, move |state| {
            let url = url.clone();
            async move {
                let Some(offset) = state else {
                    return Ok::<_, ExportError>(None);
                };
                let page: RecordsPage = self.get_json(url, offset.as_deref()).await?;
                debug!("Fetched {} records from {}", page.records.len(), table);
                Ok(Some((page.records, page.offset.map(Some))))
            }
        })
        .boxed()
    }
}
