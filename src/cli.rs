//! CLI parsing and orchestration. Parses args, starts the download daemon,
//! runs the interactive session. Maps errors to exit codes.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::aria2::{spawn_daemon, Aria2Client, Aria2Error, DaemonOptions};
use crate::config;
use crate::scraper::PoliteClient;
use crate::session::{Session, SessionError};

const DEFAULT_BASE_URL: &str = "http://www.loyalbooks.com";
const DEFAULT_DOWNLOADS_DIR: &str = "audiobooks";
const DEFAULT_RPC_SECRET: &str = "abfetch";
const DEFAULT_RPC_PORT: u16 = 6800;
const DEFAULT_ARIA2_PATH: &str = "aria2c";
const DEFAULT_STARTUP_WAIT_SECS: u64 = 2;
const DEFAULT_DELAY_SECS: u64 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Daemon(#[from] Aria2Error),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Session(_) => 2,
            CliRunError::Daemon(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "abfetch")]
#[command(about = "Browse the LoyalBooks audiobook catalog and queue chapter downloads to aria2")]
#[command(
    after_help = "Config file keys (downloads_dir, base_url, user_agent, request_delay_secs, timeout_secs, rpc_secret, rpc_port, aria2_path, startup_wait_secs) are read from ./abfetch.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    /// Catalog page to open first.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Catalog site base URL (overrides config).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Root directory for downloaded audiobooks (overrides config; default ./audiobooks).
    #[arg(short = 'd', long)]
    pub downloads_dir: Option<PathBuf>,

    /// aria2 RPC secret token (overrides config).
    #[arg(long)]
    pub rpc_secret: Option<String>,

    /// aria2 RPC port (overrides config; default 6800).
    #[arg(long)]
    pub rpc_port: Option<u16>,

    /// Path to the aria2c binary (overrides config; default "aria2c").
    #[arg(long)]
    pub aria2_path: Option<String>,

    /// Seconds to wait after starting aria2c before first use (overrides config; default 2).
    #[arg(long)]
    pub startup_wait: Option<u64>,

    /// Do not spawn aria2c; submit to an already-running daemon.
    #[arg(long)]
    pub no_spawn: bool,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Delay between catalog/feed requests in seconds (overrides config; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose diagnostics and error chains (RUST_LOG overrides).
    #[arg(long)]
    pub verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "abfetch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    // Diagnostics go to stderr; stdout is the interactive UI.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Entry point for the CLI. Returns Ok(()) on a clean session end; Err with
/// exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    init_logging(args.verbose);

    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let downloads_root = args
        .downloads_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.downloads_dir.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADS_DIR));
    let rpc_secret = args
        .rpc_secret
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.rpc_secret.clone()))
        .unwrap_or_else(|| DEFAULT_RPC_SECRET.to_string());
    let rpc_port = args
        .rpc_port
        .or_else(|| config.as_ref().and_then(|c| c.rpc_port))
        .unwrap_or(DEFAULT_RPC_PORT);
    let aria2_path = args
        .aria2_path
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.aria2_path.clone()))
        .unwrap_or_else(|| DEFAULT_ARIA2_PATH.to_string());
    let startup_wait_secs = args
        .startup_wait
        .or_else(|| config.as_ref().and_then(|c| c.startup_wait_secs))
        .unwrap_or(DEFAULT_STARTUP_WAIT_SECS);
    let delay_secs = args
        .delay
        .or_else(|| config.as_ref().and_then(|c| c.request_delay_secs))
        .unwrap_or(DEFAULT_DELAY_SECS);
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));

    let mut builder = PoliteClient::builder()
        .delay_secs(delay_secs)
        .timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    std::fs::create_dir_all(&downloads_root).map_err(|e| {
        CliRunError::InvalidInput(format!(
            "Cannot create downloads directory {}: {}",
            downloads_root.display(),
            e
        ))
    })?;

    // Keep the handle alive for the session; the daemon itself outlives us.
    let _daemon = if args.no_spawn {
        debug!("skipping aria2c spawn; expecting a daemon on port {}", rpc_port);
        None
    } else {
        let mut options = DaemonOptions::new(rpc_secret.clone());
        options.path = aria2_path;
        options.startup_wait = Duration::from_secs(startup_wait_secs);
        Some(spawn_daemon(&options)?)
    };

    let aria2 = Aria2Client::local(rpc_port, rpc_secret)
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create RPC client: {}", e)))?;

    let mut session = Session {
        client: &mut client,
        aria2: &aria2,
        base_url: &base_url,
        downloads_root: &downloads_root,
        quiet: args.quiet,
    };
    session.run(args.page)?;
    Ok(())
}
