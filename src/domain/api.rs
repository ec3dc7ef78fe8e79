//! The remote cluster as seen by the report pipeline.
//!
//! Everything downstream of the session talks to the cluster through
//! [`SnapshotApi`], so the grouping and sizing logic can run against the
//! real REST client or an in-memory fake.

use thiserror::Error;

use super::types::SnapshotEntry;

pub const SNAPSHOT_NOT_FOUND: &str = "snapshot_not_found_error";
pub const NO_SUCH_INODE: &str = "fs_no_such_inode_error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The snapshot was deleted between listing and the follow-up call.
    #[error("snapshot {id} not found")]
    SnapshotNotFound { id: String },

    /// The path id no longer resolves to a file.
    #[error("no such inode {id}")]
    NoSuchInode { id: String },

    #[error("{url} returned {status}: {}", describe(.class, .description))]
    Status {
        url: String,
        status: u16,
        class: Option<String>,
        description: Option<String>,
    },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("parsing response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Map a cluster error class onto the variants callers branch on.
    pub fn from_class(
        url: &str,
        status: u16,
        class: Option<String>,
        description: Option<String>,
        subject: &str,
    ) -> Self {
        match class.as_deref() {
            Some(SNAPSHOT_NOT_FOUND) => ApiError::SnapshotNotFound {
                id: subject.to_string(),
            },
            Some(NO_SUCH_INODE) => ApiError::NoSuchInode {
                id: subject.to_string(),
            },
            _ => ApiError::Status {
                url: url.to_string(),
                status,
                class,
                description,
            },
        }
    }

    /// True for the expected "it went away" conditions.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::SnapshotNotFound { .. } | ApiError::NoSuchInode { .. }
        )
    }
}

fn describe(class: &Option<String>, description: &Option<String>) -> String {
    match (class, description) {
        (Some(c), Some(d)) => format!("{}: {}", c, d),
        (Some(c), None) => c.clone(),
        (None, Some(d)) => d.clone(),
        (None, None) => "no error body".to_string(),
    }
}

pub trait SnapshotApi {
    fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, ApiError>;

    /// Bytes held exclusively by one snapshot.
    fn capacity_used_by_snapshot(&self, id: &str) -> Result<u64, ApiError>;

    /// Bytes that deleting all of `ids` together would free.
    fn calculate_used_capacity(&self, ids: &[String]) -> Result<u64, ApiError>;

    /// Resolve a file id to its path string.
    fn file_path(&self, path_id: &str) -> Result<String, ApiError>;

    fn total_used_capacity(&self) -> Result<u64, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_map_to_variants() {
        let e = ApiError::from_class("u", 404, Some(SNAPSHOT_NOT_FOUND.into()), None, "9");
        assert!(matches!(e, ApiError::SnapshotNotFound { ref id } if id == "9"));
        assert!(e.is_not_found());

        let e = ApiError::from_class("u", 404, Some(NO_SUCH_INODE.into()), None, "12");
        assert!(matches!(e, ApiError::NoSuchInode { ref id } if id == "12"));

        let e = ApiError::from_class(
            "https://c:8000/v1/x",
            500,
            Some("internal_error".into()),
            Some("boom".into()),
            "1",
        );
        assert!(!e.is_not_found());
        assert_eq!(
            e.to_string(),
            "https://c:8000/v1/x returned 500: internal_error: boom"
        );
    }

    #[test]
    fn status_without_body_still_displays() {
        let e = ApiError::from_class("u", 502, None, None, "1");
        assert_eq!(e.to_string(), "u returned 502: no error body");
    }
}
