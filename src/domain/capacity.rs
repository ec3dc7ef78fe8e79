//! Capacity calculation per group.
//!
//! On-demand snapshots are sized one by one; every other group is sized with
//! a single bulk request over its member ids. The result list holds the
//! on-demand group first (always, if present) followed by the groups whose
//! bulk request succeeded.

use tracing::{debug, error};

use super::api::{ApiError, SnapshotApi};
use super::grouper::Groups;
use super::snapshot::SnapGroup;

pub fn calculate_sizes(api: &dyn SnapshotApi, groups: Groups) -> Vec<SnapGroup> {
    let (on_demand, grouped): (Vec<_>, Vec<_>) = groups
        .into_vec()
        .into_iter()
        .partition(|g| g.key.is_on_demand());

    let mut results = Vec::with_capacity(on_demand.len() + grouped.len());
    for mut group in on_demand {
        size_on_demand(api, &mut group);
        results.push(group);
    }
    for mut group in grouped {
        if size_group(api, &mut group).is_ok() {
            results.push(group);
        }
    }
    results
}

/// Size each member individually. Members that vanished or failed keep a
/// size of zero; the group's own size is left untouched.
pub fn size_on_demand(api: &dyn SnapshotApi, group: &mut SnapGroup) {
    for snap in &mut group.snapshots {
        match api.capacity_used_by_snapshot(&snap.id) {
            Ok(bytes) => {
                snap.size = bytes;
                debug!(snapshot = %snap.id, bytes, "On-demand snapshot capacity");
            }
            Err(ApiError::SnapshotNotFound { .. }) => {
                debug!(snapshot = %snap.id, "Snapshot no longer exists, skipping");
            }
            Err(e) => {
                error!(snapshot = %snap.id, error = %e, "Unexpected error sizing snapshot");
            }
        }
    }
}

pub fn size_group(api: &dyn SnapshotApi, group: &mut SnapGroup) -> Result<u64, ApiError> {
    let ids = group.snapshot_ids();
    match api.calculate_used_capacity(&ids) {
        Ok(bytes) => {
            group.size = bytes;
            debug!(group = %group.name, bytes, snapshots = ?ids, "Group capacity");
            Ok(bytes)
        }
        Err(e) => {
            error!(group = %group.key, error = %e, "Error calculating size for group");
            Err(e)
        }
    }
}
