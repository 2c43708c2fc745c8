//! Shared error type for catalog and feed fetching.

use thiserror::Error;

/// Errors from catalog page and feed retrieval/parsing.
///
/// Every external call returns an explicit Result with one of these; callers
/// decide whether the failure ends the session (catalog fetch) or only the
/// current operation (feed fetch).
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body: {source}")]
    BodyRead { source: reqwest::Error },

    #[error("Could not parse feed at {url}: {reason}")]
    FeedParse { url: String, reason: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}
