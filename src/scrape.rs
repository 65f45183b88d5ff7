//! Best-effort e-mail harvesting from clinic websites.
//!
//! Scraping is opportunistic: whatever happens to a fetch, the pipeline
//! keeps going. The outcome type keeps the distinct cases observable so the
//! caller can log them apart, then collapses to a set of addresses.

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::Html;

/// Desktop browser user agent. Some clinic sites refuse requests that
/// identify as a bot.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email pattern")
});

/// Asset filenames (`logo@2x.png` and friends) match the address pattern;
/// anything ending in one of these is discarded.
const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".gif", ".svg", ".webp"];

/// What happened when we tried to scrape one record's website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// The record carried no website, so there was nothing to visit.
    NoWebsite,
    /// The page was fetched and scanned. The set may be empty.
    Found(BTreeSet<String>),
    /// The fetch itself failed. Carries a reason for the log line.
    FetchFailed(String),
}

impl ScrapeOutcome {
    /// Collapses to the harvested addresses; both failure cases yield none.
    pub fn into_emails(self) -> BTreeSet<String> {
        match self {
            ScrapeOutcome::Found(emails) => emails,
            ScrapeOutcome::NoWebsite | ScrapeOutcome::FetchFailed(_) => BTreeSet::new(),
        }
    }
}

/// Fetches clinic websites and pulls e-mail addresses out of the text.
pub struct SiteScraper {
    http: reqwest::Client,
}

impl SiteScraper {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Scrapes `url` for e-mail addresses.
    ///
    /// An empty `url` means the record has no website and nothing is
    /// fetched. Transport failures (timeouts, refused connections, body
    /// read errors) never propagate; they come back as
    /// [`ScrapeOutcome::FetchFailed`]. Any HTTP response body is scanned
    /// regardless of its status code.
    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        if url.is_empty() {
            return ScrapeOutcome::NoWebsite;
        }
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ScrapeOutcome::FetchFailed(e.to_string()),
        };
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return ScrapeOutcome::FetchFailed(e.to_string()),
        };
        ScrapeOutcome::Found(extract_emails(&visible_text(&body)))
    }
}

/// Flattens an HTML document into its text content.
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

/// Scans text for e-mail addresses, lowercased and deduplicated.
fn extract_emails(text: &str) -> BTreeSet<String> {
    EMAIL_PATTERN
        .find_iter(text)
        .map(|found| found.as_str().to_lowercase())
        .filter(|email| !IMAGE_EXTENSIONS.iter().any(|ext| email.ends_with(ext)))
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────
