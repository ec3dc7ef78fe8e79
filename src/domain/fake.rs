//! In-memory cluster used by the pipeline tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::api::{ApiError, SnapshotApi};
use super::types::SnapshotEntry;

#[derive(Default)]
pub struct FakeCluster {
    pub entries: Vec<SnapshotEntry>,
    pub list_fails: bool,
    pub paths: HashMap<String, String>,
    pub broken_paths: HashSet<String>,
    pub per_snapshot: HashMap<String, u64>,
    pub deleted: HashSet<String>,
    pub broken_snapshots: HashSet<String>,
    pub bulk: u64,
    /// Bulk calls fail when any of these ids is part of the request.
    pub bulk_fails_for: HashSet<String>,
    pub total: Option<u64>,
    pub path_lookups: RefCell<Vec<String>>,
}

impl FakeCluster {
    pub fn entry(
        id: &str,
        policy: Option<&str>,
        path_id: &str,
        name: &str,
        exp: &str,
    ) -> SnapshotEntry {
        SnapshotEntry {
            id: id.into(),
            policy_id: policy.map(Into::into),
            source_file_id: path_id.into(),
            name: name.into(),
            expiration: Some(exp.to_string()).filter(|e| !e.is_empty()),
        }
    }

    /// Four snapshots: two on policy "1" over path "1", two on-demand over
    /// paths "2" and "4". Per-snapshot capacity 1024, bulk 2048.
    pub fn four_snapshots() -> Self {
        let entries = vec![
            Self::entry("1", Some("1"), "1", "snap_1", "2024-12-31T00:00:00Z"),
            Self::entry("2", None, "2", "snap_2", "2025-01-01T00:00:00Z"),
            Self::entry("3", Some("1"), "1", "snap_11", "2024-12-31T00:00:00Z"),
            Self::entry("4", None, "4", "snap_4", "2025-05-01T00:00:00Z"),
        ];
        let paths = [("1", "/PathFoo"), ("2", "/PathBaz"), ("4", "/Unknown Path")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let per_snapshot = ["1", "2", "3", "4"]
            .into_iter()
            .map(|id| (id.to_string(), 1024))
            .collect();
        Self {
            entries,
            paths,
            per_snapshot,
            bulk: 2048,
            total: Some(4096),
            ..Default::default()
        }
    }

    fn other(what: &str) -> ApiError {
        ApiError::Status {
            url: format!("fake://{}", what),
            status: 500,
            class: Some("internal_error".into()),
            description: Some("injected".into()),
        }
    }
}

impl SnapshotApi for FakeCluster {
    fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, ApiError> {
        if self.list_fails {
            return Err(Self::other("snapshots"));
        }
        Ok(self.entries.clone())
    }

    fn capacity_used_by_snapshot(&self, id: &str) -> Result<u64, ApiError> {
        if self.deleted.contains(id) {
            return Err(ApiError::SnapshotNotFound { id: id.into() });
        }
        if self.broken_snapshots.contains(id) {
            return Err(Self::other("capacity"));
        }
        self.per_snapshot
            .get(id)
            .copied()
            .ok_or_else(|| ApiError::SnapshotNotFound { id: id.into() })
    }

    fn calculate_used_capacity(&self, ids: &[String]) -> Result<u64, ApiError> {
        if ids.iter().any(|id| self.bulk_fails_for.contains(id)) {
            return Err(Self::other("calculate"));
        }
        Ok(self.bulk)
    }

    fn file_path(&self, path_id: &str) -> Result<String, ApiError> {
        self.path_lookups.borrow_mut().push(path_id.to_string());
        if self.broken_paths.contains(path_id) {
            return Err(Self::other("files"));
        }
        self.paths
            .get(path_id)
            .cloned()
            .ok_or_else(|| ApiError::NoSuchInode { id: path_id.into() })
    }

    fn total_used_capacity(&self) -> Result<u64, ApiError> {
        self.total.ok_or_else(|| Self::other("total"))
    }
}
