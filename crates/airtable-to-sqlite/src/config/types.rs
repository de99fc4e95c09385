//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::source::DEFAULT_API_URL;

/// Placeholder in the output path replaced by the base's display name.
pub const OUTPUT_PLACEHOLDER: &str = "{}";

/// Default output path template.
pub const DEFAULT_OUTPUT: &str = "{}.db";

/// Root configuration structure.
///
/// Every field is optional in the YAML file; command line flags and
/// environment variables are merged on top before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Airtable personal access token.
    #[serde(default, skip_serializing)]
    pub personal_access_token: String,

    /// Name tables and columns after Airtable ids instead of names.
    #[serde(default)]
    pub prefer_ids: bool,

    /// Output path template; `{}` is replaced by the base name (or id).
    #[serde(default = "default_output")]
    pub output: String,

    /// Bases to export. Empty means every base visible to the token.
    #[serde(default)]
    pub base_ids: Vec<String>,

    /// Airtable API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            personal_access_token: String::new(),
            prefer_ids: false,
            output: default_output(),
            base_ids: Vec::new(),
            api_url: default_api_url(),
        }
    }
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
