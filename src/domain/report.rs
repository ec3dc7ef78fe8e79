//! Report rows — flat display strings derived from sized groups.

use super::api::SnapshotApi;
use super::grouper::resolve_path;
use super::snapshot::{GroupBy, SnapGroup, ON_DEMAND};

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

pub const NOT_APPLICABLE: &str = "N/A";

pub type ReportRow = Vec<String>;

pub fn headers(by: GroupBy) -> &'static [&'static str] {
    match by {
        GroupBy::Policy => &[
            "Policy ID",
            "Path",
            "Snapshot Name(s)",
            "Size",
            "Snapshot ID(s)",
            "Expiration Dates",
        ],
        GroupBy::SourcePath => &["Path ID", "Path", "Snapshot Name", "Size", "Snapshot ID(s)"],
    }
}

/// Binary units, one decimal place: `1536` → `1.5KiB`.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// Date part of an ISO-8601 timestamp.
fn date_part(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

/// Build the report rows. On-demand snapshots get one row each, with their
/// path looked up again; every other group collapses into a single summary
/// row.
pub fn build_rows(api: &dyn SnapshotApi, results: &[SnapGroup]) -> Vec<ReportRow> {
    let mut rows = Vec::new();

    for group in results.iter().filter(|g| g.key.is_on_demand()) {
        for snap in &group.snapshots {
            rows.push(vec![
                ON_DEMAND.to_string(),
                resolve_path(api, &snap.path_id, &snap.id),
                snap.name.clone(),
                format_bytes(snap.size),
                snap.id.clone(),
                snap.expiration
                    .clone()
                    .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            ]);
        }
    }

    for group in results.iter().filter(|g| !g.key.is_on_demand()) {
        let names: Vec<&str> = group.snapshots.iter().map(|s| s.name.as_str()).collect();
        let ids: Vec<&str> = group.snapshots.iter().map(|s| s.id.as_str()).collect();
        rows.push(vec![
            group.key.to_string(),
            group.path.clone(),
            names.join(", "),
            format_bytes(group.size),
            ids.join(", "),
            group
                .earliest_expiration()
                .map(date_part)
                .unwrap_or(NOT_APPLICABLE)
                .to_string(),
        ]);
    }

    rows
}
