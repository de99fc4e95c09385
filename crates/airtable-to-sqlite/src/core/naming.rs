//! Display-name resolution for tables, fields and views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything Airtable identifies by both a stable id and a human-readable name.
pub trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

/// Which of the two identifiers becomes the SQLite table/column name.
///
/// Chosen once per run. Table names, column names and junction-table names are
/// computed independently in several places and only agree when every one of
/// them resolves through the same preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NamingPreference {
    /// Use the human-readable name.
    #[default]
    Name,
    /// Use the stable Airtable id.
    Id,
}

impl NamingPreference {
    /// Build from the `--prefer-ids` flag.
    pub fn from_prefer_ids(prefer_ids: bool) -> Self {
        if prefer_ids {
            NamingPreference::Id
        } else {
            NamingPreference::Name
        }
    }

    /// Resolve the destination name of an entity.
    pub fn resolve<'a, N: Named + ?Sized>(self, entity: &'a N) -> &'a str {
        match self {
            NamingPreference::Id => entity.id(),
            NamingPreference::Name => entity.name(),
        }
    }

    /// Value stored under `prefer_ids` in the settings table.
    pub fn as_str(self) -> &'static str {
        match self {
            NamingPreference::Name => "NAME",
            NamingPreference::Id => "ID",
        }
    }
}

impl fmt::Display for NamingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
