//! Snapshot inventory — the listing fetched once per run.

use tracing::{error, info};

use super::api::SnapshotApi;
use super::types::SnapshotEntry;

pub struct SnapshotInventory {
    entries: Vec<SnapshotEntry>,
}

impl SnapshotInventory {
    /// Fetch the listing. A failed listing is logged and yields an empty
    /// inventory, so the reports simply come out empty.
    pub fn fetch(api: &dyn SnapshotApi) -> Self {
        let entries = match api.list_snapshots() {
            Ok(entries) => {
                info!(count = entries.len(), "Retrieved {} snapshots", entries.len());
                entries
            }
            Err(e) => {
                error!(error = %e, "Error fetching snapshots");
                Vec::new()
            }
        };
        Self { entries }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
