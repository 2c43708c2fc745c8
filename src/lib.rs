//! abfetch: interactive CLI for the LoyalBooks audiobook catalog, queueing
//! per-chapter downloads onto a local aria2 daemon.

pub mod aria2;
pub mod cli;
pub mod config;
pub mod model;
pub mod scraper;
pub mod session;

// Re-exports for CLI and consumers.
pub use aria2::{spawn_daemon, Aria2Client, Aria2Error, DaemonHandle, DaemonOptions, SubmissionReport};
pub use model::{canonical_dir_name, BookListing, DownloadJob, PaginationState};
pub use scraper::{PoliteClient, PoliteClientBuilder, ScrapeError};
pub use session::{parse_command, transition, Command, Reject, Session, SessionError, Transition};
