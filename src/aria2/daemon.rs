//! Launching the aria2c daemon as a detached background process.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tracing::debug;

use super::Aria2Error;

const DEFAULT_ARIA2_PATH: &str = "aria2c";
const DEFAULT_STARTUP_WAIT: Duration = Duration::from_secs(2);

/// How to launch aria2c.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Path to the aria2c binary.
    pub path: String,
    /// Shared RPC secret; the client must present the same token.
    pub secret: String,
    /// Settling delay after spawn. Best-effort readiness wait, not a health
    /// check: if the daemon is still not up, submissions fail individually.
    pub startup_wait: Duration,
}

impl DaemonOptions {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            path: DEFAULT_ARIA2_PATH.to_string(),
            secret: secret.into(),
            startup_wait: DEFAULT_STARTUP_WAIT,
        }
    }
}

/// Handle to the spawned daemon.
///
/// The daemon keeps running when the handle is dropped; it serves downloads
/// that outlive the interactive session.
#[derive(Debug)]
pub struct DaemonHandle {
    child: Child,
}

impl DaemonHandle {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Spawn aria2c with RPC enabled, then sleep the settling delay.
pub fn spawn_daemon(options: &DaemonOptions) -> Result<DaemonHandle, Aria2Error> {
    let child = Command::new(&options.path)
        .args(daemon_args(&options.secret))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Aria2Error::Spawn {
            path: options.path.clone(),
            source: e,
        })?;
    debug!("aria2c started (pid {})", child.id());
    std::thread::sleep(options.startup_wait);
    Ok(DaemonHandle { child })
}

fn daemon_args(secret: &str) -> Vec<String> {
    vec![
        "--enable-rpc".to_string(),
        "--rpc-listen-all".to_string(),
        format!("--rpc-secret={}", secret),
        "--disable-ipv6".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_args_enable_rpc_with_secret() {
        let args = daemon_args("s3cret");
        assert!(args.contains(&"--enable-rpc".to_string()));
        assert!(args.contains(&"--rpc-listen-all".to_string()));
        assert!(args.contains(&"--rpc-secret=s3cret".to_string()));
        assert!(args.contains(&"--disable-ipv6".to_string()));
    }

    #[test]
    fn spawn_fails_with_missing_binary() {
        let options = DaemonOptions {
            path: "/nonexistent/abfetch-test-aria2c".to_string(),
            secret: "x".to_string(),
            startup_wait: Duration::from_secs(0),
        };
        let result = spawn_daemon(&options);
        assert!(matches!(result, Err(Aria2Error::Spawn { .. })));
    }
}
