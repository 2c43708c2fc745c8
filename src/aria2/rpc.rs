//! JSON-RPC client for the aria2 job queue.
//!
//! Single method in use: `aria2.addUri`, one URI per call, with the target
//! directory passed as the `dir` download option.

use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::Aria2Error;
use crate::model::DownloadJob;

const ADD_URI_METHOD: &str = "aria2.addUri";
const RPC_TIMEOUT_SECS: u64 = 10;

/// Blocking client for one aria2 RPC endpoint.
#[derive(Debug)]
pub struct Aria2Client {
    endpoint: String,
    secret: String,
    http: reqwest::blocking::Client,
    next_id: Cell<u64>,
}

/// Result of a best-effort batch submission.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    /// GIDs of jobs the daemon accepted, in submission order.
    pub queued: Vec<String>,
    pub failed: usize,
}

impl SubmissionReport {
    pub fn attempted(&self) -> usize {
        self.queued.len() + self.failed
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcFailure>,
}

#[derive(Debug, Deserialize)]
struct RpcFailure {
    code: i64,
    message: String,
}

impl Aria2Client {
    pub fn new(
        endpoint: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(RPC_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            secret: secret.into(),
            http,
            next_id: Cell::new(1),
        })
    }

    /// Client for a daemon listening on localhost.
    pub fn local(port: u16, secret: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::new(format!("http://localhost:{}/jsonrpc", port), secret)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Queue one URI with the daemon, placing the download under `dir`.
    /// Returns the GID aria2 assigned.
    pub fn add_uri(&self, uri: &str, dir: &Path) -> Result<String, Aria2Error> {
        let payload = add_uri_request(self.take_id(), &self.secret, uri, dir);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .map_err(|e| Aria2Error::Transport {
                url: self.endpoint.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            // aria2 answers RPC-level failures with HTTP 400 and a JSON-RPC
            // error body; surface that message when present.
            if let Ok(parsed) = response.json::<RpcResponse>() {
                if let Some(failure) = parsed.error {
                    return Err(Aria2Error::Rpc {
                        code: failure.code,
                        message: failure.message,
                    });
                }
            }
            return Err(Aria2Error::HttpStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }
        let parsed: RpcResponse =
            response
                .json()
                .map_err(|e| Aria2Error::MalformedResponse {
                    reason: e.to_string(),
                })?;
        if let Some(failure) = parsed.error {
            return Err(Aria2Error::Rpc {
                code: failure.code,
                message: failure.message,
            });
        }
        match parsed.result {
            Some(serde_json::Value::String(gid)) => Ok(gid),
            other => Err(Aria2Error::MalformedResponse {
                reason: format!("expected GID string, got {:?}", other),
            }),
        }
    }

    /// Submit jobs in order. Per-job failures are logged and skipped; the
    /// batch always runs to the end.
    pub fn submit_all(
        &self,
        jobs: &[DownloadJob],
        progress: Option<&dyn Fn(u32, u32)>,
    ) -> SubmissionReport {
        let total = jobs.len() as u32;
        let mut report = SubmissionReport::default();
        for (i, job) in jobs.iter().enumerate() {
            if let Some(p) = progress {
                p(i as u32 + 1, total);
            }
            match self.add_uri(&job.media_url, &job.target_dir) {
                Ok(gid) => report.queued.push(gid),
                Err(e) => {
                    warn!("could not queue {}: {}", job.media_url, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn take_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

fn add_uri_request(id: u64, secret: &str, uri: &str, dir: &Path) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id.to_string(),
        "method": ADD_URI_METHOD,
        "params": [format!("token:{}", secret), [uri], {"dir": dir.to_string_lossy()}],
    })
}
