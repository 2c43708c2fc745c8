//! Book feed fetching and translation into download jobs.
//!
//! Each detail page exposes an RSS feed at `<detail-link>/feed`; every item's
//! enclosure holds one chapter's media URL. Translation derives the target
//! directory from the feed title and creates it before any job is submitted,
//! whether or not the feed lists any enclosures (downstream tooling relies on
//! the directory existing even for empty feeds).

use std::io;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::{canonical_dir_name, DownloadJob};
use crate::scraper::error::ScrapeError;
use crate::scraper::PoliteClient;

/// Fixed suffix appended to a detail link to reach its feed.
const FEED_SUFFIX: &str = "/feed";

/// Title used when the feed carries none.
const UNKNOWN_TITLE: &str = "unknown_title";

/// A parsed book feed: the title plus chapter media URLs in feed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub title: Option<String>,
    pub enclosures: Vec<String>,
}

/// Fetch and parse the feed behind a detail link.
///
/// Transport failure, a non-2xx status, and malformed XML are all explicit
/// errors; the controller logs them and keeps the session going.
pub fn fetch_feed(client: &mut PoliteClient, detail_link: &str) -> Result<Feed, ScrapeError> {
    let url = format!("{}{}", detail_link.trim_end_matches('/'), FEED_SUFFIX);
    let response = client.get(&url).map_err(|e| ScrapeError::Network {
        url: url.clone(),
        source: e,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::HttpStatus {
            status: status.as_u16(),
            url,
        });
    }
    let body = response.text().map_err(|e| ScrapeError::BodyRead { source: e })?;
    parse_feed(&body, &url)
}

/// Parse RSS into a [Feed].
///
/// The book title is the first non-empty `<title>` text in document order
/// (the channel title on a well-formed feed). Each `<item>` contributes at
/// most its first `<enclosure url=..>`; items without one are skipped.
pub fn parse_feed(xml: &str, url: &str) -> Result<Feed, ScrapeError> {
    let mut reader = Reader::from_str(xml);

    let mut feed = Feed::default();
    let mut in_item = false;
    let mut item_has_enclosure = false;
    let mut in_title = false;
    let mut title_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    item_has_enclosure = false;
                }
                b"title" if feed.title.is_none() => {
                    in_title = true;
                    title_buf.clear();
                }
                b"enclosure" => {
                    if in_item && !item_has_enclosure {
                        if let Some(u) = enclosure_url(&e) {
                            feed.enclosures.push(u);
                            item_has_enclosure = true;
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"enclosure" && in_item && !item_has_enclosure {
                    if let Some(u) = enclosure_url(&e) {
                        feed.enclosures.push(u);
                        item_has_enclosure = true;
                    }
                }
            }
            Ok(Event::Text(t)) if in_title => {
                let text = t.unescape().map_err(|e| ScrapeError::FeedParse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
                title_buf.push_str(&text);
            }
            Ok(Event::CData(t)) if in_title => {
                title_buf.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"title" if in_title => {
                    in_title = false;
                    let trimmed = title_buf.trim();
                    if !trimmed.is_empty() {
                        feed.title = Some(trimmed.to_string());
                    }
                }
                b"item" => in_item = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScrapeError::FeedParse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
    }
    Ok(feed)
}

fn enclosure_url(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"url" {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Translate a feed into download jobs under `downloads_root`.
///
/// Creates the book directory (including parents) unconditionally, then emits
/// one job per enclosure. Creation is idempotent; an existing directory is
/// not an error.
pub fn prepare_jobs(feed: &Feed, downloads_root: &Path) -> io::Result<(PathBuf, Vec<DownloadJob>)> {
    let title = feed.title.as_deref().unwrap_or(UNKNOWN_TITLE);
    let target_dir = downloads_root.join(canonical_dir_name(title));
    std::fs::create_dir_all(&target_dir)?;
    let jobs = feed
        .enclosures
        .iter()
        .map(|media_url| DownloadJob {
            target_dir: target_dir.clone(),
            media_url: media_url.clone(),
        })
        .collect();
    Ok((target_dir, jobs))
}
