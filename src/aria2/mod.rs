//! aria2 integration: daemon launch and JSON-RPC job submission.

mod daemon;
mod rpc;

pub use daemon::{spawn_daemon, DaemonHandle, DaemonOptions};
pub use rpc::{Aria2Client, SubmissionReport};

use thiserror::Error;

/// Errors from daemon launch and RPC submission.
#[derive(Debug, Error)]
pub enum Aria2Error {
    #[error("Could not start aria2c ({path}): {source}. Is aria2 installed and on PATH?")]
    Spawn {
        path: String,
        source: std::io::Error,
    },

    #[error("RPC transport error at {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP {status} from RPC endpoint {url}")]
    HttpStatus { status: u16, url: String },

    #[error("aria2 RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC response: {reason}")]
    MalformedResponse { reason: String },
}
