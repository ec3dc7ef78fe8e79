use std::fmt;

use super::types::SnapshotEntry;

pub const ON_DEMAND: &str = "on_demand";

/// Which snapshot attribute a report is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Policy,
    SourcePath,
}

impl GroupBy {
    pub const ALL: [GroupBy; 2] = [GroupBy::Policy, GroupBy::SourcePath];

    /// Field name of the key in the snapshot listing.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Policy => "policy_id",
            GroupBy::SourcePath => "source_file_id",
        }
    }

    pub fn key_of<'a>(&self, entry: &'a SnapshotEntry) -> Option<&'a str> {
        match self {
            GroupBy::Policy => entry.policy_id.as_deref(),
            GroupBy::SourcePath => Some(entry.source_file_id.as_str()).filter(|s| !s.is_empty()),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group identity. Snapshots with no value for the grouping attribute share
/// the `OnDemand` group, which never compares equal to a real id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    OnDemand,
    Id(String),
}

impl GroupKey {
    pub fn from_entry(entry: &SnapshotEntry, by: GroupBy) -> Self {
        match by.key_of(entry) {
            Some(id) => GroupKey::Id(id.to_string()),
            None => GroupKey::OnDemand,
        }
    }

    pub fn is_on_demand(&self) -> bool {
        matches!(self, GroupKey::OnDemand)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::OnDemand => f.write_str(ON_DEMAND),
            GroupKey::Id(id) => f.write_str(id),
        }
    }
}

/// A snapshot as carried through the report pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapInfo {
    pub id: String,
    pub name: String,
    pub expiration: Option<String>,
    pub path_id: String,
    pub path: String,
    pub size: u64,
}

impl SnapInfo {
    pub fn new(entry: &SnapshotEntry, path: String) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            expiration: entry.expiration.clone(),
            path_id: entry.source_file_id.clone(),
            path,
            size: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapGroup {
    pub key: GroupKey,
    pub name: String,
    pub path: String,
    pub snapshots: Vec<SnapInfo>,
    pub size: u64,
}

impl SnapGroup {
    pub fn new(key: GroupKey, first: SnapInfo) -> Self {
        let path = if key.is_on_demand() {
            "N/A".to_string()
        } else {
            first.path.clone()
        };
        Self {
            name: key.to_string(),
            key,
            path,
            snapshots: vec![first],
            size: 0,
        }
    }

    pub fn snapshot_ids(&self) -> Vec<String> {
        self.snapshots.iter().map(|s| s.id.clone()).collect()
    }

    /// Earliest known expiration, by string order over ISO-8601 text.
    pub fn earliest_expiration(&self) -> Option<&str> {
        self.snapshots
            .iter()
            .filter_map(|s| s.expiration.as_deref())
            .filter(|e| *e != "N/A")
            .min()
    }
}
