//! Configuration validation.

use super::{Config, OUTPUT_PLACEHOLDER};
use crate::error::{ExportError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.personal_access_token.trim().is_empty() {
        return Err(ExportError::Config(
            "personal access token is required (--personal-access-token or AIRTABLE_PERSONAL_ACCESS_TOKEN)"
                .into(),
        ));
    }

    if config.output.is_empty() {
        return Err(ExportError::Config("output is required".into()));
    }

    if config.api_url.is_empty() {
        return Err(ExportError::Config("api_url is required".into()));
    }

    if config.base_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ExportError::Config("base ids must not be empty".into()));
    }

    validate_output(&config.output, config.base_ids.len())
}

/// Several bases need a placeholder, or they would overwrite one file.
pub fn validate_output(output: &str, base_count: usize) -> Result<()> {
    if base_count > 1 && !output.contains(OUTPUT_PLACEHOLDER) {
        return Err(ExportError::Config(
            "Output filename must contain '{}' when converting more than one base".into(),
        ));
    }
    Ok(())
}
