//! Canonical data model for the catalog browser.
//!
//! The catalog parser produces [BookListing] and [PaginationState]; the feed
//! translator produces [DownloadJob]. Nothing here is persisted.

use std::path::PathBuf;

/// One book row on a catalog page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListing {
    pub title: String,
    /// "Unknown Author" when the page carries no author text for the row.
    pub author: String,
    /// Absolute URL of the book's detail page. None means nothing downloadable.
    pub detail_link: Option<String>,
    /// Absolute URL of the cover image, when present.
    pub cover_url: Option<String>,
}

/// Pagination extracted from a catalog page.
///
/// `previous_page` is Some iff `current_page > 1`; `next_page` is Some iff
/// `current_page < total_pages`. Both are derived by the constructors, never
/// set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl PaginationState {
    /// Build from parsed marker values. `total` is clamped up to `current` so
    /// the total >= current invariant always holds.
    pub fn new(current: u32, total: u32) -> Self {
        let current = current.max(1);
        let total = total.max(current);
        Self {
            current_page: current,
            total_pages: total,
            previous_page: if current > 1 { Some(current - 1) } else { None },
            next_page: if current < total { Some(current + 1) } else { None },
        }
    }

    /// Fallback when the pagination marker is missing or unparseable: the
    /// requested page is treated as the only page.
    pub fn single(page: u32) -> Self {
        Self::new(page, page)
    }
}

/// One download to hand to the daemon: a media URL and where to place it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub target_dir: PathBuf,
    pub media_url: String,
}

/// Directory name for a book, derived from its feed title.
///
/// Keeps the part before the literal `" by "` separator, trims, lowercases,
/// replaces spaces with hyphens, and strips apostrophes. Deterministic: the
/// same feed title always maps to the same directory name.
pub fn canonical_dir_name(feed_title: &str) -> String {
    let before_author = feed_title.split(" by ").next().unwrap_or(feed_title);
    before_author
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace('\'', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_dir_name_strips_author_suffix() {
        assert_eq!(
            canonical_dir_name("Pride and Prejudice by Jane Austen"),
            "pride-and-prejudice"
        );
    }

    #[test]
    fn canonical_dir_name_is_idempotent() {
        let once = canonical_dir_name("A Tale of Two Cities by Charles Dickens");
        let twice = canonical_dir_name("A Tale of Two Cities by Charles Dickens");
        assert_eq!(once, twice);
        assert_eq!(once, "a-tale-of-two-cities");
    }

    #[test]
    fn canonical_dir_name_strips_apostrophes() {
        assert_eq!(
            canonical_dir_name("Gulliver's Travels by Jonathan Swift"),
            "gullivers-travels"
        );
    }

    #[test]
    fn canonical_dir_name_without_separator_keeps_whole_title() {
        assert_eq!(canonical_dir_name("Beowulf"), "beowulf");
        assert_eq!(canonical_dir_name("  The Odyssey  "), "the-odyssey");
    }

    #[test]
    fn canonical_dir_name_unknown_title_literal() {
        assert_eq!(canonical_dir_name("unknown_title"), "unknown_title");
    }

    #[test]
    fn pagination_middle_page_has_both_neighbors() {
        let p = PaginationState::new(3, 5);
        assert_eq!(p.current_page, 3);
        assert_eq!(p.total_pages, 5);
        assert_eq!(p.previous_page, Some(2));
        assert_eq!(p.next_page, Some(4));
    }

    #[test]
    fn pagination_first_page_has_no_previous() {
        let p = PaginationState::new(1, 5);
        assert_eq!(p.previous_page, None);
        assert_eq!(p.next_page, Some(2));
    }

    #[test]
    fn pagination_last_page_has_no_next() {
        let p = PaginationState::new(5, 5);
        assert_eq!(p.previous_page, Some(4));
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn pagination_single_page_has_neither() {
        let p = PaginationState::single(1);
        assert_eq!(p.previous_page, None);
        assert_eq!(p.next_page, None);
        assert_eq!(p.total_pages, 1);
    }

    #[test]
    fn pagination_total_clamped_to_current() {
        let p = PaginationState::new(4, 2);
        assert_eq!(p.total_pages, 4);
        assert_eq!(p.next_page, None);
        assert_eq!(p.previous_page, Some(3));
    }
}
