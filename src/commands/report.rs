//! `qsnap --action 1` — snapshot capacity reports by policy and by path.

use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, error, info, warn};

use crate::client::{ClientOptions, ClusterClient, Credentials};
use crate::domain::api::SnapshotApi;
use crate::domain::capacity::calculate_sizes;
use crate::domain::grouper::group_snapshots;
use crate::domain::inventory::SnapshotInventory;
use crate::domain::report::{build_rows, format_bytes, headers, ReportRow};
use crate::domain::snapshot::GroupBy;

const COLUMN_WIDTH: usize = 20;
const TRUNCATE_AT: usize = 15;
const TRUNCATED_COLUMNS: [usize; 2] = [2, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Policy and path usage reports.
    UsageReport,
    /// Reserved.
    Placeholder,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(Action::UsageReport),
            "2" => Ok(Action::Placeholder),
            other => anyhow::bail!("Invalid action '{}'. Please specify '1' or '2'.", other),
        }
    }
}

pub fn run(
    creds: &Credentials,
    opts: &ClientOptions,
    action: &str,
    filename: Option<&Path>,
) -> Result<()> {
    let client = match ClusterClient::connect(creds, opts) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Login failed");
            std::process::exit(1);
        }
    };

    let inventory = SnapshotInventory::fetch(&client);
    if inventory.is_empty() {
        warn!("No snapshots to report on");
    }
    log_total_capacity(&client);

    match action.parse::<Action>() {
        Ok(Action::UsageReport) => {
            for by in GroupBy::ALL {
                generate(&client, &inventory, by, filename)?;
            }
        }
        Ok(Action::Placeholder) => debug!("Action 2 is reserved, nothing to do"),
        Err(e) => error!("{}", e),
    }
    Ok(())
}

fn log_total_capacity(api: &dyn SnapshotApi) {
    match api.total_used_capacity() {
        Ok(bytes) => info!(bytes, "Total capacity reported {}", format_bytes(bytes)),
        Err(e) => error!(error = %e, "Error fetching total snapshot capacity"),
    }
}

/// One full pass for a grouping key: group, size, build rows, emit.
pub fn generate(
    api: &dyn SnapshotApi,
    inventory: &SnapshotInventory,
    by: GroupBy,
    filename: Option<&Path>,
) -> Result<()> {
    let rows = report_rows(api, inventory, by);
    let headers = headers(by);

    match filename {
        Some(path) => {
            write_csv(path, headers, &rows)?;
            info!(file = %path.display(), "Report saved to {}", path.display());
        }
        None => {
            info!("Snapshot Report by {}", by);
            println!("{}", format!("═══ Snapshot Report by {} ═══", by).cyan().bold());
            print!("{}", render_table(headers, &rows));
            println!(
                "{} {}",
                "Report generated at:".dimmed(),
                chrono::Local::now().to_rfc3339()
            );
            debug!("Snapshot report displayed");
        }
    }
    Ok(())
}

pub fn report_rows(
    api: &dyn SnapshotApi,
    inventory: &SnapshotInventory,
    by: GroupBy,
) -> Vec<ReportRow> {
    let groups = group_snapshots(api, inventory.entries(), by);
    let results = calculate_sizes(api, groups);
    build_rows(api, &results)
}

fn truncate(cell: &str) -> String {
    if cell.chars().count() > TRUNCATE_AT {
        let head: String = cell.chars().take(TRUNCATE_AT).collect();
        format!("{}...", head)
    } else {
        cell.to_string()
    }
}

/// Fixed-width console table. Name and id cells are shortened so the
/// columns stay readable.
pub fn render_table(headers: &[&str], rows: &[ReportRow]) -> String {
    let mut out = String::new();
    for h in headers {
        out.push_str(&format!("{:<width$}", h, width = COLUMN_WIDTH));
    }
    out.push('\n');
    out.push_str(&"-".repeat(100));
    out.push('\n');
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let cell = if TRUNCATED_COLUMNS.contains(&i) {
                truncate(cell)
            } else {
                cell.clone()
            };
            out.push_str(&format!("{:<width$}", cell, width = COLUMN_WIDTH));
        }
        out.push('\n');
    }
    out
}

/// Append a quoted header row and the data rows. Existing content is kept.
pub fn write_csv(path: &Path, headers: &[&str], rows: &[ReportRow]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    // Path reports carry an expiration cell their header doesn't name.
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .flexible(true)
        .from_writer(file);

    writer
        .write_record(headers)
        .with_context(|| format!("writing {}", path.display()))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fake::FakeCluster;

    fn row(cells: &[&str]) -> ReportRow {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn action_parsing() {
        assert_eq!("1".parse::<Action>().unwrap(), Action::UsageReport);
        assert_eq!("2".parse::<Action>().unwrap(), Action::Placeholder);
        let err = "3".parse::<Action>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid action '3'. Please specify '1' or '2'.");
    }

    #[test]
    fn truncate_is_char_based() {
        assert_eq!(truncate("snap_1"), "snap_1");
        assert_eq!(truncate("exactly_fifteen"), "exactly_fifteen");
        assert_eq!(truncate("snap_1, snap_11, snap_12"), "snap_1, snap_11...");
        assert_eq!(truncate(&"ß".repeat(17)), format!("{}...", "ß".repeat(15)));
    }

    #[test]
    fn table_layout() {
        let rows = vec![row(&[
            "1",
            "/PathFoo",
            "snap_1, snap_11, snap_12",
            "2.0KiB",
            "1, 3, 5, 7, 9, 11",
            "2024-12-31",
        ])];
        let table = render_table(headers(GroupBy::Policy), &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(&format!("{:<20}{:<20}", "Policy ID", "Path")));
        assert_eq!(lines[1], "-".repeat(100));
        assert_eq!(
            lines[2],
            format!(
                "{:<20}{:<20}{:<20}{:<20}{:<20}{:<20}",
                "1", "/PathFoo", "snap_1, snap_11...", "2.0KiB", "1, 3, 5, 7, 9, ...", "2024-12-31"
            )
        );
    }

    #[test]
    fn csv_appends_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let api = FakeCluster::four_snapshots();
        let inventory = SnapshotInventory::fetch(&api);

        generate(&api, &inventory, GroupBy::Policy, Some(path.as_path())).unwrap();
        generate(&api, &inventory, GroupBy::SourcePath, Some(path.as_path())).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            r#""Policy ID","Path","Snapshot Name(s)","Size","Snapshot ID(s)","Expiration Dates""#
        );
        assert_eq!(
            lines[3],
            r#""1","/PathFoo","snap_1, snap_11","2.0KiB","1, 3","2024-12-31""#
        );
        assert_eq!(lines[4], r#""Path ID","Path","Snapshot Name","Size","Snapshot ID(s)""#);
        // 1 header + 3 rows, then 1 header + 3 rows
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn csv_never_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "previous run\n").unwrap();

        write_csv(&path, headers(GroupBy::SourcePath), &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains(r#""Path ID""#));
    }

    #[test]
    fn empty_inventory_yields_header_only() {
        let api = FakeCluster {
            list_fails: true,
            ..FakeCluster::four_snapshots()
        };
        let inventory = SnapshotInventory::fetch(&api);
        let rows = report_rows(&api, &inventory, GroupBy::Policy);
        assert!(rows.is_empty());
        assert_eq!(render_table(headers(GroupBy::Policy), &rows).lines().count(), 2);
    }
}
