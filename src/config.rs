//! Layered configuration: defaults → YAML file → `QSNAP_*` env → CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{ClientOptions, Credentials, DEFAULT_PORT};
use crate::domain::types::opt_string_or_number;

pub const ENV_PREFIX: &str = "QSNAP_";

/// Keys taken from the environment as raw text. Figment would read
/// `QSNAP_PASSWORD=007` as the number 7.
const VERBATIM_ENV_KEYS: [&str; 4] = ["host", "username", "password", "token"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub host: Option<String>,
    pub port: u16,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub token: Option<String>,
    pub filename: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            username: None,
            password: None,
            token: None,
            filename: None,
            log_level: "info".to_string(),
            log_json: false,
            verify_tls: false,
            timeout_secs: 30,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub log_json: bool,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("qsnap").join("config.yaml"))
    }

    fn figment(file: Option<&Path>) -> Result<Figment> {
        let file = match file {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&VERBATIM_ENV_KEYS));
        for key in VERBATIM_ENV_KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Ok(value) = std::env::var(&var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        Ok(figment)
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("--host is required")]
    MissingHost,
    #[error("Either --username or --token must be provided.")]
    MissingAuth,
}

impl Config {
    pub fn check_credentials(&self) -> Result<(), CredentialsError> {
        if self.host.as_deref().map_or(true, str::is_empty) {
            return Err(CredentialsError::MissingHost);
        }
        if self.token.is_none() && self.username.is_none() {
            return Err(CredentialsError::MissingAuth);
        }
        Ok(())
    }

    /// Token login wins when both forms are configured. A missing password
    /// is asked for through `prompt`.
    pub fn credentials<F>(&self, prompt: F) -> Result<Credentials>
    where
        F: FnOnce() -> Result<String>,
    {
        self.check_credentials()?;
        let host = self.host.clone().unwrap_or_default();
        let port = self.port;

        if let Some(token) = &self.token {
            return Ok(Credentials::Token {
                host,
                port,
                token: token.clone(),
            });
        }

        let username = self.username.clone().unwrap_or_default();
        let password = match &self.password {
            Some(p) => p.clone(),
            None => prompt()?,
        };
        Ok(Credentials::Password {
            host,
            port,
            username,
            password,
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: std::time::Duration::from_secs(self.timeout_secs),
            verify_tls: self.verify_tls,
        }
    }
}

/// Load the config. An explicit `--config` path must exist; the default
/// location is optional.
pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    if let Some(path) = file {
        if !path.exists() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
    }
    Config::figment(file)?
        .merge(Serialized::defaults(overrides))
        .extract()
        .context("loading configuration")
}
