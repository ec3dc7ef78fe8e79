//! Partition the inventory into policy or path groups.

use std::collections::HashMap;

use tracing::{debug, error, info};

use super::api::SnapshotApi;
use super::snapshot::{GroupBy, GroupKey, SnapGroup, SnapInfo};
use super::types::SnapshotEntry;

pub const PATH_NOT_FOUND: &str = "Path not found";
pub const PATH_UNKNOWN_ERROR: &str = "Unknown error";

/// Resolve a path id for display. Never fails: a vanished inode becomes
/// `Path not found`, anything else `Unknown error`.
pub fn resolve_path(api: &dyn SnapshotApi, path_id: &str, snapshot: &str) -> String {
    match api.file_path(path_id) {
        Ok(path) => {
            debug!(snapshot, path = %path, "Resolved snapshot path");
            path
        }
        Err(e) if e.is_not_found() => {
            debug!(snapshot, path_id, error = %e, "Snapshot source path no longer exists");
            PATH_NOT_FOUND.to_string()
        }
        Err(e) => {
            error!(snapshot, path_id, error = %e, "Unexpected error resolving snapshot path");
            PATH_UNKNOWN_ERROR.to_string()
        }
    }
}

/// Groups in first-seen order.
#[derive(Debug, Default)]
pub struct Groups {
    groups: Vec<SnapGroup>,
    index: HashMap<GroupKey, usize>,
}

impl Groups {
    fn insert(&mut self, key: GroupKey, info: SnapInfo) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].snapshots.push(info),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(SnapGroup::new(key, info));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn into_vec(self) -> Vec<SnapGroup> {
        self.groups
    }
}

#[cfg(test)]
impl Groups {
    pub fn get(&self, key: &GroupKey) -> Option<&SnapGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapGroup> {
        self.groups.iter()
    }
}

pub fn group_snapshots(api: &dyn SnapshotApi, entries: &[SnapshotEntry], by: GroupBy) -> Groups {
    let mut groups = Groups::default();
    for entry in entries {
        let key = GroupKey::from_entry(entry, by);
        let path = resolve_path(api, &entry.source_file_id, &entry.name);
        debug!(
            snapshot = %entry.id,
            group = %key,
            path = %path,
            "Processing snapshot"
        );
        groups.insert(key, SnapInfo::new(entry, path));
    }
    info!(
        groups = groups.len(),
        group_by = %by,
        "Grouped snapshots into {} groups based on {}",
        groups.len(),
        by
    );
    groups
}
