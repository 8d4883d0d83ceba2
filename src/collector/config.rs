//! Collector configuration constants and retry policy

use std::time::Duration;

/// Concurrent page-listing fetches (stage N1).
pub const PAGE_CONCURRENCY: usize = 2;

/// Concurrent per-game detail fetches (stage N2).
pub const DETAIL_CONCURRENCY: usize = 4;

/// Concurrent catalog batch requests (stage N3).
pub const CATALOG_CONCURRENCY: usize = 3;

/// Maximum number of ids the catalog API accepts per request.
pub const CATALOG_LIMIT: usize = 500;

/// Upper bound on the discovered page count. Guards against a pagination
/// control reporting a nonsensical last page.
pub const MAX_PAGES: usize = 10_000;

/// Maximum number of 429 retries for site scraping requests.
/// The site throttles per minute, so ten retries at 60s covers a long window.
pub const SITE_MAX_RETRIES: u32 = 10;

/// Maximum number of 429 retries for catalog API requests.
pub const CATALOG_MAX_RETRIES: u32 = 5;

/// Fixed wait after a 429 from the profile site.
pub const SITE_BACKOFF_MS: u64 = 60_000;

/// Fixed wait after a 429 from the catalog API (4 requests/second window).
pub const CATALOG_BACKOFF_MS: u64 = 1_000;

/// Pause after each successful per-item detail fetch.
pub const DETAIL_PACING_MS: u64 = 1_000;

/// Initial delay for exponential backoff.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Cap for exponential catalog backoff. The site schedule is capped at
/// [`SITE_BACKOFF_MS`] instead.
pub const MAX_BACKOFF_MS: u64 = 30_000;

fn exponential_delay(initial: Duration, max: Duration, retry_count: u32) -> Duration {
    let factor = 2u32.saturating_pow(retry_count);
    initial.saturating_mul(factor).min(max)
}

/// How long to wait before retrying a throttled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * 2^retry`, capped at `max`
    Exponential {
        /// Delay before the first retry
        initial: Duration,
        /// Upper bound for any single delay
        max: Duration,
    },
}

impl Backoff {
    /// Doubling schedule starting at [`INITIAL_BACKOFF_MS`], capped at `max`.
    pub fn exponential(max: Duration) -> Self {
        Backoff::Exponential {
            initial: Duration::from_millis(INITIAL_BACKOFF_MS),
            max,
        }
    }

    /// Delay before retry number `retry_count` (0-based).
    pub fn delay(&self, retry_count: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => exponential_delay(initial, max, retry_count),
        }
    }
}

/// Per-fetcher retry and pacing policy.
///
/// Each [`crate::fetcher::http::RateLimitedFetcher`] owns one of these, so the
/// site scraper and the catalog client share the retry loop but not its timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first throttled attempt
    pub max_retries: u32,
    /// Delay schedule between throttled attempts
    pub backoff: Backoff,
    /// Pause after every successful fetch (zero disables)
    pub pacing: Duration,
}

impl RetryPolicy {
    /// Policy for the profile site: long fixed backoff, no pacing.
    pub fn site() -> Self {
        Self {
            max_retries: SITE_MAX_RETRIES,
            backoff: Backoff::Fixed(Duration::from_millis(SITE_BACKOFF_MS)),
            pacing: Duration::ZERO,
        }
    }

    /// Policy for per-game detail pages: site backoff plus a pause after each success.
    pub fn site_detail() -> Self {
        Self {
            pacing: Duration::from_millis(DETAIL_PACING_MS),
            ..Self::site()
        }
    }

    /// Policy for the catalog API: short fixed backoff, no pacing.
    pub fn catalog() -> Self {
        Self {
            max_retries: CATALOG_MAX_RETRIES,
            backoff: Backoff::Fixed(Duration::from_millis(CATALOG_BACKOFF_MS)),
            pacing: Duration::ZERO,
        }
    }

    /// Replace the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replace the backoff schedule.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the post-success pause.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}
