//! Error types for the export library.

use thiserror::Error;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration error (invalid YAML, missing token, bad output template, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more requested base ids are not visible to the access token
    #[error("Base IDs {} not found in Airtable account", .missing.join(", "))]
    BaseNotFound { missing: Vec<String> },

    /// Airtable answered with a non-success status
    #[error("Airtable API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error talking to Airtable
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Destination database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Foreign key could not be applied (missing table or column, duplicate constraint)
    #[error("Cannot add foreign key on {table}: {message}")]
    ForeignKey { table: String, message: String },

    /// Table or column name rejected before reaching SQL
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Create a ForeignKey error for the given owning table.
    pub fn foreign_key(table: impl Into<String>, message: impl Into<String>) -> Self {
        ExportError::ForeignKey {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a BaseNotFound error; ids are sorted and deduplicated.
    pub fn base_not_found<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut missing: Vec<String> = missing.into_iter().map(Into::into).collect();
        missing.sort();
        missing.dedup();
        ExportError::BaseNotFound { missing }
    }

    /// Process exit code for this error.
    ///
    /// Usage errors exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::Config(_) => 2,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
