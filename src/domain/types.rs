//! Wire types for the cluster REST API.
//!
//! The cluster is loose about number encoding: ids and byte counts arrive as
//! JSON numbers on some endpoints and as decimal strings on others. The
//! helpers at the bottom accept both.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub bearer_token: String,
}

/// Identity behind the current bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotList {
    #[serde(default)]
    pub entries: Vec<SnapshotEntry>,
}

/// One entry of the snapshot listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub policy_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub source_file_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_non_empty")]
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotCapacity {
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub capacity_used_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapacityBytes {
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileAttributes {
    pub path: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error_class: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Num(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Str(s) => s,
            StringOrNumber::Num(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(StringOrNumber::deserialize(d)?.into_string())
}

pub(crate) fn opt_string_or_number<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?
        .map(StringOrNumber::into_string)
        .filter(|s| !s.is_empty()))
}

fn opt_non_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.is_empty()))
}

fn u64_from_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match StringOrNumber::deserialize(d)? {
        StringOrNumber::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        StringOrNumber::Num(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("not a byte count: {}", n))),
    }
}
