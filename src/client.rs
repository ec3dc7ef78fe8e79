//! Typed blocking client for the cluster REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::api::{ApiError, SnapshotApi};
use crate::domain::types::{
    CapacityBytes, ErrorBody, FileAttributes, LoginRequest, LoginResponse, SessionUser,
    SnapshotCapacity, SnapshotEntry, SnapshotList,
};

pub const DEFAULT_PORT: u16 = 8000;

/// How to authenticate against the cluster.
#[derive(Debug, Clone)]
pub enum Credentials {
    Token {
        host: String,
        port: u16,
        token: String,
    },
    Password {
        host: String,
        port: u16,
        username: String,
        password: String,
    },
}

impl Credentials {
    fn host_port(&self) -> (&str, u16) {
        match self {
            Credentials::Token { host, port, .. } | Credentials::Password { host, port, .. } => {
                (host, *port)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            verify_tls: false,
        }
    }
}

/// An authenticated session with one cluster.
pub struct ClusterClient {
    base_url: String,
    http: Client,
}

impl ClusterClient {
    /// Establish a session. The password form performs the login exchange
    /// and carries the returned bearer token from then on. A supplied token
    /// is checked with one authenticated call before it is trusted.
    pub fn connect(creds: &Credentials, opts: &ClientOptions) -> Result<Self> {
        let (host, port) = creds.host_port();
        let base_url = base_url(host, port);

        let token = match creds {
            Credentials::Token { token, .. } => token.clone(),
            Credentials::Password {
                username, password, ..
            } => {
                let anon = build_http(opts, None)?;
                let url = format!("{}/v1/session/login", base_url);
                let resp: LoginResponse = send(
                    anon.post(&url).json(&LoginRequest { username, password }),
                    &url,
                    username,
                )
                .with_context(|| format!("logging in to {} as {}", host, username))?;
                resp.bearer_token
            }
        };

        let http = build_http(opts, Some(&token))?;
        match creds {
            Credentials::Token { .. } => {
                let url = format!("{}/v1/session/who-am-i", base_url);
                let user: SessionUser = send(http.get(&url), &url, "session")
                    .with_context(|| format!("validating token against {}", host))?;
                info!(
                    host,
                    user = user.name.as_deref().unwrap_or("unknown"),
                    "Logged in with authentication token"
                )
            }
            Credentials::Password { username, .. } => {
                info!(host, username = %username, "Logged in with username and password")
            }
        }

        Ok(Self { base_url, http })
    }

    // ── Internal helpers ───────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, subject: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        send(self.http.get(&url), &url, subject)
    }

    fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        subject: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "POST");
        send(self.http.post(&url).json(body), &url, subject)
    }
}

impl SnapshotApi for ClusterClient {
    fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, ApiError> {
        let list: SnapshotList = self.get("/v2/snapshots/", "snapshots")?;
        Ok(list.entries)
    }

    fn capacity_used_by_snapshot(&self, id: &str) -> Result<u64, ApiError> {
        let path = format!("/v1/snapshots/capacity-used-per-snapshot/{}", id);
        let cap: SnapshotCapacity = self.get(&path, id)?;
        Ok(cap.capacity_used_bytes)
    }

    fn calculate_used_capacity(&self, ids: &[String]) -> Result<u64, ApiError> {
        let cap: CapacityBytes =
            self.post("/v1/snapshots/calculate-used-capacity", ids, &ids.join(","))?;
        Ok(cap.bytes)
    }

    fn file_path(&self, path_id: &str) -> Result<String, ApiError> {
        let path = format!("/v1/files/{}/info/attributes", path_id);
        let attrs: FileAttributes = self.get(&path, path_id)?;
        Ok(attrs.path)
    }

    fn total_used_capacity(&self) -> Result<u64, ApiError> {
        let total: CapacityBytes = self.get("/v1/snapshots/total-used-capacity", "total")?;
        Ok(total.bytes)
    }
}

fn base_url(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("https://{}:{}", host, port)
    }
}

fn build_http(opts: &ClientOptions, token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("bearer token contains invalid header characters")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Client::builder()
        .timeout(opts.timeout)
        .danger_accept_invalid_certs(!opts.verify_tls)
        .default_headers(headers)
        .build()
        .context("building HTTP client")
}

/// Send a request and decode either the success body or the cluster's
/// error body. `subject` is the id the call is about, carried into the
/// not-found variants.
fn send<T: DeserializeOwned>(req: RequestBuilder, url: &str, subject: &str) -> Result<T, ApiError> {
    let resp = req.send().map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;
    let status = resp.status();
    let body = resp.text().map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        let err: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        return Err(ApiError::from_class(
            url,
            status.as_u16(),
            err.error_class,
            err.description,
            subject,
        ));
    }

    serde_json::from_str(&body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}
