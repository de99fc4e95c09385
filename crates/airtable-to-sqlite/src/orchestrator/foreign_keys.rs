//! Foreign keys collected while building tables, applied once at the end.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::core::schema::ForeignKey;
use crate::core::traits::Destination;
use crate::error::Result;

/// Deduplicated, ordered set of foreign keys waiting to be applied.
#[derive(Debug, Default)]
pub struct PendingForeignKeys {
    keys: BTreeSet<ForeignKey>,
}

impl PendingForeignKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key. Returns false if it was already pending.
    pub fn add(&mut self, fk: ForeignKey) -> bool {
        debug!("Pending foreign key {}", fk);
        self.keys.insert(fk)
    }

    pub fn extend(&mut self, fks: impl IntoIterator<Item = ForeignKey>) {
        for fk in fks {
            self.add(fk);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForeignKey> {
        self.keys.iter()
    }

    /// Apply every pending key and empty the set.
    ///
    /// The destination validates the whole set before changing anything, so on
    /// error no constraint has been added. The set is emptied either way.
    pub async fn apply(&mut self, destination: &dyn Destination) -> Result<usize> {
        let keys: Vec<ForeignKey> = std::mem::take(&mut self.keys).into_iter().collect();
        if keys.is_empty() {
            return Ok(0);
        }

        info!("Adding {} foreign keys", keys.len());
        destination.add_foreign_keys(&keys).await?;
        Ok(keys.len())
    }
}
