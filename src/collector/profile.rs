//! Paginated profile collection
//!
//! Walks a user's game listing page by page, then visits each game's log page
//! to fill in status, play time and platforms.

use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::collector::group::BoundedGroup;
use crate::collector::{CollectError, CollectResult};
use crate::fetcher::http::RateLimitedFetcher;
use crate::fetcher::pagination::page_numbers;
use crate::fetcher::profile_parser::{parse_last_page, parse_log_details, parse_log_entries};
use crate::fetcher::{FetcherError, Transport};
use crate::metrics::StageMetrics;
use crate::settings::Settings;
use crate::LogEntry;

/// Collects every [`LogEntry`] on a profile
#[derive(Clone)]
pub struct ProfileCollector {
    site_url: String,
    listing: RateLimitedFetcher,
    details: RateLimitedFetcher,
    pages: BoundedGroup,
    detail_group: BoundedGroup,
}

impl ProfileCollector {
    /// Build from run settings and a shared transport
    pub fn new(settings: &Settings, transport: Arc<dyn Transport>) -> Self {
        Self {
            site_url: settings.site_url.trim_end_matches('/').to_string(),
            listing: RateLimitedFetcher::new("site", Arc::clone(&transport), settings.site_retry),
            details: RateLimitedFetcher::new("site_detail", transport, settings.detail_retry),
            pages: BoundedGroup::new("pages", settings.page_concurrency),
            detail_group: BoundedGroup::new("details", settings.detail_concurrency),
        }
    }

    /// Listing root for `username`
    pub fn games_url(&self, username: &str) -> String {
        format!("{}/u/{}/games/", self.site_url, username)
    }

    /// One listing page for `username`
    pub fn page_url(&self, username: &str, page: usize) -> String {
        format!("{}?page={}", self.games_url(username), page)
    }

    /// Log page of one game for `username`
    pub fn log_url(&self, username: &str, slug: &str) -> String {
        format!("{}/u/{}/logs/{}", self.site_url, username, slug)
    }

    /// Collect all log entries, in listing order, with details merged.
    ///
    /// # Errors
    /// - [`CollectError::ProfileAbsent`] if the listing root is 404
    /// - [`CollectError::EmptyProfile`] if no games are listed
    /// - any fatal fetch or parse error from a page or log fetch
    pub async fn collect(&self, username: &str) -> CollectResult<Vec<LogEntry>> {
        let metrics = StageMetrics::start("profile");
        let result = self
            .collect_inner(username)
            .instrument(info_span!("profile", username = %username))
            .await;
        match &result {
            Ok(entries) => metrics.record_success(entries.len()),
            Err(e) => metrics.record_failure(e.kind().as_str()),
        }
        result
    }

    async fn collect_inner(&self, username: &str) -> CollectResult<Vec<LogEntry>> {
        let last_page = self.discover_page_count(username).await?;
        info!(username = %username, pages = last_page, "Discovered listing pages");

        let mut entries = self.fetch_pages(username, last_page).await?;
        if entries.is_empty() {
            warn!(username = %username, "Profile lists no games");
            return Err(CollectError::EmptyProfile {
                username: username.to_string(),
            });
        }
        info!(username = %username, games = entries.len(), "Extracted log stubs");

        self.fetch_details(username, &mut entries).await?;
        info!(username = %username, games = entries.len(), "Merged log details");
        Ok(entries)
    }

    async fn discover_page_count(&self, username: &str) -> CollectResult<usize> {
        let url = self.games_url(username);
        let body = match self.listing.get(&url).await {
            Ok(body) => body,
            Err(FetcherError::NotFound { .. }) => {
                return Err(CollectError::ProfileAbsent {
                    username: username.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let last_page = parse_last_page(&body)?;
        // Rejects counts above MAX_PAGES.
        page_numbers(last_page)?;
        Ok(last_page)
    }

    async fn fetch_pages(&self, username: &str, last_page: usize) -> CollectResult<Vec<LogEntry>> {
        let tasks = page_numbers(last_page)?.map(|page| {
            let url = self.page_url(username, page);
            async move {
                let body = self.listing.get(&url).await?;
                let stubs = parse_log_entries(&body, username)?;
                debug!(page = page, stubs = stubs.len(), "Parsed listing page");
                Ok::<_, CollectError>((page, stubs))
            }
        });

        let mut pages = self.pages.run(tasks).await?;
        pages.sort_unstable_by_key(|(page, _)| *page);
        Ok(pages.into_iter().flat_map(|(_, stubs)| stubs).collect())
    }

    async fn fetch_details(&self, username: &str, entries: &mut [LogEntry]) -> CollectResult<()> {
        let tasks = entries.iter().enumerate().map(|(index, entry)| {
            let url = self.log_url(username, &entry.slug);
            async move {
                let body = self.details.get(&url).await?;
                let details = parse_log_details(&body)?;
                Ok::<_, CollectError>((index, details))
            }
        });

        let merged = self.detail_group.run(tasks).await?;
        for (index, details) in merged {
            entries[index].merge_details(details);
        }
        Ok(())
    }
}
