//! Interactive controller: fetch -> display -> choose -> (download | paginate).
//!
//! The page cursor is an explicit value threaded through [transition]; there
//! is no ambient current-page state. Only a failed catalog fetch or an empty
//! listing ends the session; everything else re-prompts.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::aria2::Aria2Client;
use crate::model::{BookListing, PaginationState};
use crate::scraper::catalog::{self, CatalogPage};
use crate::scraper::{feed, PoliteClient, ScrapeError};

/// Session-fatal failures. User-input mistakes never produce one of these.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not fetch the book list: {0}")]
    Fetch(#[from] ScrapeError),

    #[error("No books found on page {page}.")]
    NoBooks { page: u32 },

    #[error("Could not read input: {0}")]
    Input(#[from] io::Error),
}

/// A parsed prompt entry: a 1-based listing index, or a page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(u32),
    Next,
    Previous,
}

/// Parse one line of user input. Accepts a number, `n`, or `p`
/// (case-insensitive, surrounding whitespace ignored); anything else is None.
pub fn parse_command(input: &str) -> Option<Command> {
    let normalized = input.trim().to_lowercase();
    if let Ok(n) = normalized.parse::<u32>() {
        return Some(Command::Select(n));
    }
    match normalized.as_str() {
        "n" => Some(Command::Next),
        "p" => Some(Command::Previous),
        _ => None,
    }
}

/// Outcome of applying a command to the current listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Start a download for the 0-based listing index, then redisplay the
    /// same page.
    Download(usize),
    /// Move to another page.
    GoTo(u32),
    /// Stay on the page and re-prompt with a message.
    Reject(Reject),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    OutOfRange,
    NoNextPage,
    NoPreviousPage,
}

/// Pure transition function for the listing-page state machine.
pub fn transition(
    pagination: &PaginationState,
    listing_len: usize,
    command: Command,
) -> Transition {
    match command {
        Command::Select(n) => {
            if n >= 1 && (n as usize) <= listing_len {
                Transition::Download(n as usize - 1)
            } else {
                Transition::Reject(Reject::OutOfRange)
            }
        }
        Command::Next => match pagination.next_page {
            Some(page) => Transition::GoTo(page),
            None => Transition::Reject(Reject::NoNextPage),
        },
        Command::Previous => match pagination.previous_page {
            Some(page) => Transition::GoTo(page),
            None => Transition::Reject(Reject::NoPreviousPage),
        },
    }
}

/// One interactive browsing session over the catalog.
pub struct Session<'a> {
    pub client: &'a mut PoliteClient,
    pub aria2: &'a Aria2Client,
    pub base_url: &'a str,
    pub downloads_root: &'a Path,
    pub quiet: bool,
}

impl Session<'_> {
    /// Run the loop from `start_page` until a fatal fetch failure, an empty
    /// listing, or end of input on stdin.
    pub fn run(&mut self, start_page: u32) -> Result<(), SessionError> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.run_with_input(start_page, &mut input)
    }

    fn run_with_input(
        &mut self,
        start_page: u32,
        input: &mut dyn BufRead,
    ) -> Result<(), SessionError> {
        let mut page = start_page.max(1);
        loop {
            let CatalogPage { books, pagination } =
                catalog::fetch_catalog_page(self.client, self.base_url, page)?;
            if books.is_empty() {
                return Err(SessionError::NoBooks { page });
            }

            display_books(&books);
            println!(
                "Page {} of {}",
                pagination.current_page, pagination.total_pages
            );

            match self.prompt_loop(&books, &pagination, input)? {
                Some(next) => page = next,
                None => return Ok(()), // end of input
            }
        }
    }

    /// Prompt until the user triggers a download attempt or a page change;
    /// returns the page to fetch next, or None on end of input.
    fn prompt_loop(
        &mut self,
        books: &[BookListing],
        pagination: &PaginationState,
        input: &mut dyn BufRead,
    ) -> Result<Option<u32>, SessionError> {
        loop {
            print!(
                "Enter the number of the book you want to download, or 'n' for next page, 'p' for previous page: "
            );
            io::stdout().flush().map_err(SessionError::Input)?;

            let mut line = String::new();
            if input.read_line(&mut line).map_err(SessionError::Input)? == 0 {
                return Ok(None);
            }

            let command = match parse_command(&line) {
                Some(c) => c,
                None => {
                    println!(
                        "Invalid input. Please enter a number, 'n' for next page, or 'p' for previous page."
                    );
                    continue;
                }
            };

            match transition(pagination, books.len(), command) {
                Transition::Download(index) => {
                    self.download(&books[index]);
                    // Redisplay the same page after any download attempt.
                    return Ok(Some(pagination.current_page));
                }
                Transition::GoTo(page) => return Ok(Some(page)),
                Transition::Reject(Reject::OutOfRange) => {
                    println!(
                        "Invalid choice. Please enter a number between 1 and {}.",
                        books.len()
                    );
                }
                Transition::Reject(Reject::NoNextPage) => {
                    println!("No next page available.");
                }
                Transition::Reject(Reject::NoPreviousPage) => {
                    println!("No previous page available.");
                }
            }
        }
    }

    /// Resolve one listing through feed -> jobs -> daemon. Failures are
    /// reported to the user and logged; none of them end the session.
    fn download(&mut self, book: &BookListing) {
        let link = match &book.detail_link {
            Some(l) => l.clone(),
            None => {
                println!(
                    "\"{}\" has no detail page; nothing to download.",
                    book.title
                );
                return;
            }
        };

        let parsed_feed = match feed::fetch_feed(self.client, &link) {
            Ok(f) => f,
            Err(e) => {
                warn!("feed fetch failed for {}: {}", link, e);
                println!("Failed to fetch the RSS feed. Please try again.");
                return;
            }
        };

        let (target_dir, jobs) = match feed::prepare_jobs(&parsed_feed, self.downloads_root) {
            Ok(v) => v,
            Err(e) => {
                warn!("could not create download directory: {}", e);
                println!("Could not create the download directory: {}", e);
                return;
            }
        };

        if jobs.is_empty() {
            println!(
                "The feed for \"{}\" lists no downloadable chapters.",
                book.title
            );
            return;
        }

        let progress_bar = if self.quiet {
            None
        } else {
            let bar = indicatif::ProgressBar::new(jobs.len() as u64);
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len}")
            {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            Some(bar)
        };
        let progress_cb = |n: u32, total: u32| {
            if let Some(bar) = &progress_bar {
                bar.set_position(n as u64);
                bar.set_message(format!("Queueing chapter {}/{}", n, total));
            }
        };
        let progress: Option<&dyn Fn(u32, u32)> = if self.quiet {
            None
        } else {
            Some(&progress_cb)
        };

        let report = self.aria2.submit_all(&jobs, progress);

        if let Some(bar) = &progress_bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }

        if report.failed > 0 {
            println!(
                "Queued {} of {} chapter downloads to {} ({} failed; see log).",
                report.queued.len(),
                report.attempted(),
                target_dir.display(),
                report.failed
            );
        } else {
            println!(
                "Queued {} chapter downloads to {}. Download started!",
                report.queued.len(),
                target_dir.display()
            );
        }
    }
}

fn display_books(books: &[BookListing]) {
    println!("Available books:");
    for (i, book) in books.iter().enumerate() {
        println!("{}. {} by {}", i + 1, book.title, book.author);
    }
    println!();
}
