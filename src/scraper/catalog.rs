//! Catalog page fetching and parsing: book listings plus the pagination marker.
//!
//! One fetch yields both, from the same HTML. Listings are best-effort: a cell
//! that does not look like a book row is skipped, never an error. Pagination
//! falls back to a single-page state when the marker is missing or garbled.

use crate::model::{BookListing, PaginationState};
use crate::scraper::error::ScrapeError;
use crate::scraper::PoliteClient;
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::warn;

/// Path segment of the paginated catalog under the site base.
const CATALOG_PATH: &str = "Top_100";

const AUTHOR_FALLBACK: &str = "Unknown Author";

/// One fetched catalog page: listings in document order plus pagination.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub books: Vec<BookListing>,
    pub pagination: PaginationState,
}

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(sel).map_err(|e| ScrapeError::Selector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Fetch one catalog page and parse listings and pagination out of it.
///
/// Transport and HTTP-status failures are returned to the caller; the
/// controller treats them (like an empty listing) as session-fatal.
pub fn fetch_catalog_page(
    client: &mut PoliteClient,
    base_url: &str,
    page: u32,
) -> Result<CatalogPage, ScrapeError> {
    let url = format!("{}/{}/{}", base_url.trim_end_matches('/'), CATALOG_PATH, page);
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
    let html = response.text().map_err(|e| ScrapeError::BodyRead { source: e })?;

    let books = parse_listings(&html, base_url)?;
    let pagination = parse_pagination(&html, page);
    Ok(CatalogPage { books, pagination })
}

/// Extract book rows from catalog HTML, in document order.
///
/// A row is a `td.layout2-blue` cell. The bold node is the title; a cell
/// without one is not a book row and is skipped. The author is the first
/// non-empty plain-text sibling after the title node, falling back to
/// "Unknown Author". Link and cover URLs are resolved absolute against the
/// site base.
pub fn parse_listings(html: &str, base_url: &str) -> Result<Vec<BookListing>, ScrapeError> {
    let doc = Html::parse_document(html);
    let entry_sel = parse_selector("td.layout2-blue")?;
    let title_sel = parse_selector("b")?;
    let link_sel = parse_selector("a[href]")?;
    let img_sel = parse_selector("img[src]")?;
    let base = Url::parse(base_url).map_err(|e| ScrapeError::InvalidUrl {
        input: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let mut books = Vec::new();
    for entry in doc.select(&entry_sel) {
        let title_el = match entry.select(&title_sel).next() {
            Some(el) => el,
            None => continue, // not a book row
        };
        let title = title_el.text().collect::<String>().trim().to_string();

        let author = title_el
            .next_siblings()
            .find_map(|node| {
                node.value()
                    .as_text()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .map(String::from)
            })
            .unwrap_or_else(|| AUTHOR_FALLBACK.to_string());

        let detail_link = entry
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string());

        let cover_url = entry
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| base.join(src).ok())
            .map(|u| u.to_string());

        books.push(BookListing {
            title,
            author,
            detail_link,
            cover_url,
        });
    }
    Ok(books)
}

/// Extract pagination from catalog HTML.
///
/// The marker text must contain `Page <current> of <total>`, with possible
/// stray characters after the total (the site renders a trailing `>`), which
/// are stripped. Anything else falls back to a single-page state for the
/// requested page with a logged warning; this never fails the fetch.
pub fn parse_pagination(html: &str, requested_page: u32) -> PaginationState {
    let doc = Html::parse_document(html);
    let marker_sel = match Selector::parse("div.result-pages") {
        Ok(s) => s,
        Err(_) => return PaginationState::single(requested_page),
    };
    let text = match doc.select(&marker_sel).next() {
        Some(el) => el.text().collect::<String>(),
        None => {
            warn!("no pagination marker on page {}", requested_page);
            return PaginationState::single(requested_page);
        }
    };
    match parse_page_marker(&text) {
        Some((current, total)) => PaginationState::new(current, total),
        None => {
            warn!(
                "pagination text parsing failed with value {:?}; treating page {} as single-page",
                text.trim(),
                requested_page
            );
            PaginationState::single(requested_page)
        }
    }
}

/// Pull (current, total) out of marker text shaped like `Page 2 of 10>`.
fn parse_page_marker(text: &str) -> Option<(u32, u32)> {
    let after_label = text.split("Page ").nth(1)?;
    let (current_str, rest) = after_label.split_once(" of ")?;
    let current: u32 = current_str.trim().parse().ok()?;
    let total_digits: String = rest
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let total: u32 = total_digits.parse().ok()?;
    Some((current, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://www.loyalbooks.com";

    fn page_html(cells: &str, pagination: &str) -> String {
        format!(
            "<html><body><table><tr>{}</tr></table>{}</body></html>",
            cells, pagination
        )
    }

    #[test]
    fn parse_listings_full_row() -> Result<(), ScrapeError> {
        let html = page_html(
            r#"<td class="layout2-blue">
<a href="/pride-and-prejudice-by-jane-austen"><img src="/image/detail/pride.jpg"/></a>
<b>Pride and Prejudice</b><br/>
Jane Austen<br/>
</td>"#,
            "",
        );
        let books = parse_listings(&html, BASE)?;
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.title, "Pride and Prejudice");
        assert_eq!(book.author, "Jane Austen");
        assert_eq!(
            book.detail_link.as_deref(),
            Some("http://www.loyalbooks.com/pride-and-prejudice-by-jane-austen")
        );
        assert_eq!(
            book.cover_url.as_deref(),
            Some("http://www.loyalbooks.com/image/detail/pride.jpg")
        );
        Ok(())
    }

    #[test]
    fn parse_listings_skips_cell_without_bold_title() -> Result<(), ScrapeError> {
        let html = page_html(
            r#"<td class="layout2-blue"><a href="/somewhere">Genres</a></td>
<td class="layout2-blue"><b>Real Book</b><br/>Some Author</td>"#,
            "",
        );
        let books = parse_listings(&html, BASE)?;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Real Book");
        Ok(())
    }

    #[test]
    fn parse_listings_defaults_author_when_no_text_sibling() -> Result<(), ScrapeError> {
        let html = page_html(
            r#"<td class="layout2-blue"><b>Orphan Book</b><br/><i>no plain text here</i></td>"#,
            "",
        );
        let books = parse_listings(&html, BASE)?;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].author, "Unknown Author");
        assert_eq!(books[0].detail_link, None);
        assert_eq!(books[0].cover_url, None);
        Ok(())
    }

    #[test]
    fn parse_listings_author_skips_whitespace_siblings() -> Result<(), ScrapeError> {
        // Whitespace-only text between <b> and the author line must not win.
        let html = page_html(
            "<td class=\"layout2-blue\"><b>Moby Dick</b>\n   \n<br/>Herman Melville</td>",
            "",
        );
        let books = parse_listings(&html, BASE)?;
        assert_eq!(books[0].author, "Herman Melville");
        Ok(())
    }

    #[test]
    fn parse_listings_keeps_absolute_hrefs() -> Result<(), ScrapeError> {
        let html = page_html(
            r#"<td class="layout2-blue"><a href="http://other.example/book"></a><b>Elsewhere</b><br/>A. Writer</td>"#,
            "",
        );
        let books = parse_listings(&html, BASE)?;
        assert_eq!(
            books[0].detail_link.as_deref(),
            Some("http://other.example/book")
        );
        Ok(())
    }

    #[test]
    fn parse_listings_preserves_document_order() -> Result<(), ScrapeError> {
        let html = page_html(
            r#"<td class="layout2-blue"><b>First</b><br/>A</td>
<td class="layout2-blue"><b>Second</b><br/>B</td>
<td class="layout2-blue"><b>Third</b><br/>C</td>"#,
            "",
        );
        let books = parse_listings(&html, BASE)?;
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        Ok(())
    }

    #[test]
    fn parse_pagination_middle_page_with_stray_trailing_char() {
        let html = page_html("", r#"<div class="result-pages">Page 2 of 10&gt;</div>"#);
        let p = parse_pagination(&html, 2);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.total_pages, 10);
        assert_eq!(p.previous_page, Some(1));
        assert_eq!(p.next_page, Some(3));
    }

    #[test]
    fn parse_pagination_first_and_last_pages() {
        let first = parse_pagination(
            &page_html("", r#"<div class="result-pages">Page 1 of 5</div>"#),
            1,
        );
        assert_eq!(first.previous_page, None);
        assert_eq!(first.next_page, Some(2));

        let last = parse_pagination(
            &page_html("", r#"<div class="result-pages">Page 5 of 5</div>"#),
            5,
        );
        assert_eq!(last.previous_page, Some(4));
        assert_eq!(last.next_page, None);
    }

    #[test]
    fn parse_pagination_marker_with_surrounding_link_text() {
        let html = page_html(
            "",
            r#"<div class="result-pages"><a href="/Top_100/1">&lt;</a> Page 2 of 10 <a href="/Top_100/3">&gt;</a></div>"#,
        );
        let p = parse_pagination(&html, 2);
        assert_eq!((p.current_page, p.total_pages), (2, 10));
    }

    #[test]
    fn parse_pagination_falls_back_when_marker_missing() {
        let p = parse_pagination("<html><body></body></html>", 7);
        assert_eq!(p, PaginationState::single(7));
    }

    #[test]
    fn parse_pagination_falls_back_on_garbled_text() {
        let html = page_html("", r#"<div class="result-pages">Results 1 to 20</div>"#);
        let p = parse_pagination(&html, 3);
        assert_eq!(p, PaginationState::single(3));
    }

    #[test]
    fn parse_page_marker_valid_and_invalid() {
        assert_eq!(parse_page_marker("Page 2 of 10>"), Some((2, 10)));
        assert_eq!(parse_page_marker("< Page 4 of 4"), Some((4, 4)));
        assert_eq!(parse_page_marker("Page x of 10"), None);
        assert_eq!(parse_page_marker("Page 2 of ten"), None);
        assert_eq!(parse_page_marker("no marker here"), None);
    }
}
