mod client;
mod commands;
mod config;
mod domain;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Overrides};

#[derive(Parser)]
#[command(
    name = "qsnap",
    version,
    about = "Snapshot capacity usage reports for Qumulo clusters"
)]
struct Cli {
    /// Cluster node IP address or FQDN
    #[arg(long)]
    host: Option<String>,

    /// REST API port (default 8000)
    #[arg(long)]
    port: Option<u16>,

    /// Username for password login
    #[arg(long)]
    username: Option<String>,

    /// Password for password login (prompted when omitted)
    #[arg(long)]
    password: Option<String>,

    /// Authentication token
    #[arg(long)]
    token: Option<String>,

    /// Action to perform. 1: snapshot usage report; 2: reserved
    #[arg(long)]
    action: String,

    /// Append the report to this CSV file instead of printing it
    #[arg(long)]
    filename: Option<PathBuf>,

    /// Path to config file (default: ~/.config/qsnap/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
            filename: self.filename.clone(),
            log_level: self.log_level.clone(),
            log_json: self.log_json,
        }
    }
}

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cfg.log_json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

fn prompt_password() -> Result<String> {
    dialoguer::Password::new()
        .with_prompt("Enter your password")
        .interact()
        .context("reading password")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref(), &cli.overrides())?;

    if let Err(e) = cfg.check_credentials() {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, e)
            .exit();
    }

    init_tracing(&cfg);

    let creds = cfg.credentials(prompt_password)?;
    commands::report::run(
        &creds,
        &cfg.client_options(),
        &cli.action,
        cfg.filename.as_deref(),
    )
}
