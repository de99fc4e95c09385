//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::core::model::BaseRecord;
use crate::core::naming::NamingPreference;
use crate::error::Result;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Not validated: the token usually arrives later from the command line.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Check the output template against the number of bases to export.
    pub fn check_output_for(&self, base_count: usize) -> Result<()> {
        validation::validate_output(&self.output, base_count)
    }

    /// Naming preference selected by `prefer_ids`.
    pub fn naming(&self) -> NamingPreference {
        NamingPreference::from_prefer_ids(self.prefer_ids)
    }

    /// Requested base ids, or `None` to export every base.
    pub fn requested_bases(&self) -> Option<&[String]> {
        if self.base_ids.is_empty() {
            None
        } else {
            Some(self.base_ids.as_slice())
        }
    }

    /// Destination path for a base.
    pub fn output_path(&self, base: &BaseRecord) -> PathBuf {
        let name = self.naming().resolve(base);
        PathBuf::from(self.output.replace(OUTPUT_PLACEHOLDER, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseRecord {
        BaseRecord {
            id: "app123".to_string(),
            name: "Base 123".to_string(),
            permission_level: "create".to_string(),
        }
    }

    #[test]
    fn test_from_yaml_defaults() {
        let config = Config::from_yaml("personal_access_token: key123\n").unwrap();
        assert_eq!(config.personal_access_token, "key123");
        assert!(!config.prefer_ids);
        assert_eq!(config.output, "{}.db");
        assert!(config.base_ids.is_empty());
        assert_eq!(config.api_url, "https://api.airtable.com/v0");
        assert!(config.requested_bases().is_none());
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
personal_access_token: key123
prefer_ids: true
output: "exports/{}.sqlite"
base_ids: [app123, app124]
api_url: http://localhost:8080/v0
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.naming(), NamingPreference::Id);
        assert_eq!(config.requested_bases().map(<[String]>::len), Some(2));
        assert_eq!(config.api_url, "http://localhost:8080/v0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_invalid() {
        assert!(Config::from_yaml("prefer_ids: [1, 2]").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/airtable.yaml").is_err());
    }

    #[test]
    fn test_output_path() {
        let mut config = Config::default();
        assert_eq!(config.output_path(&base()), PathBuf::from("Base 123.db"));

        config.prefer_ids = true;
        assert_eq!(config.output_path(&base()), PathBuf::from("app123.db"));

        config.output = "blah.db".to_string();
        assert_eq!(config.output_path(&base()), PathBuf::from("blah.db"));
    }

    #[test]
    fn test_token_not_serialized() {
        let config = Config {
            personal_access_token: "secret".to_string(),
            ..Config::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
