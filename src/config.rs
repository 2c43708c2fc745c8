//! Optional config file loading. Search order: ./abfetch.toml, then
//! $XDG_CONFIG_HOME/abfetch/config.toml (or ~/.config/abfetch/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Root directory for downloaded audiobooks. Relative paths resolve
    /// against the CWD.
    pub downloads_dir: Option<PathBuf>,
    /// Catalog site base URL.
    pub base_url: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in seconds between catalog/feed requests.
    pub request_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Shared secret for the aria2 RPC endpoint.
    pub rpc_secret: Option<String>,
    /// Port the aria2 RPC endpoint listens on.
    pub rpc_port: Option<u16>,
    /// Path to the aria2c binary.
    pub aria2_path: Option<String>,
    /// Seconds to wait after spawning aria2c before first use.
    pub startup_wait_secs: Option<u64>,
}

/// Search order: (1) ./abfetch.toml, (2) $XDG_CONFIG_HOME/abfetch/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("abfetch.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("abfetch").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}
