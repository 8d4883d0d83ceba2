//! # gamelog-harvester
//!
//! Collects a user's game logs from a paginated backloggd profile and enriches
//! them with catalog metadata from the IGDB API, persisting both as JSON.
//!
//! ## Pipeline
//!
//! 1. **Profile stage**: discover the listing's page count, fetch every page
//!    (2 at a time) to extract [`LogEntry`] stubs, then fetch each game's log
//!    page (4 at a time) and merge its [`DetailFields`].
//! 2. **Catalog stage**: cut the game ids into chunks of up to 500 and look
//!    them up in batches (3 at a time), producing [`GameRecord`]s.
//!
//! Each stage runs under a [`collector::group::BoundedGroup`]. HTTP 429 is
//! retried inside [`fetcher::http::RateLimitedFetcher`]; every other failure
//! is fatal and cancels the rest of its stage.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gamelog_harvester::collector::Pipeline;
//! use gamelog_harvester::fetcher::transport::ReqwestTransport;
//! use gamelog_harvester::output::json::JsonSaver;
//! use gamelog_harvester::settings::{Credentials, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::new(Credentials::from_env()?);
//! let transport = ReqwestTransport::new(settings.connect_timeout, settings.request_timeout)?;
//! let sink = JsonSaver::new(&settings.output_dir);
//! let summary = Pipeline::new(settings, Arc::new(transport), sink)
//!     .run("alice")
//!     .await?;
//! println!("{} logs, {} games", summary.logs, summary.games);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`collector`] - bounded groups, the two collectors and the pipeline driver
//! - [`fetcher`] - transport seam, rate-limited fetch primitive, page and API parsers
//! - [`output`] - JSON persistence
//! - [`settings`] - credentials and tunables
//! - [`metrics`] - counters and histograms for HTTP and stages

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI definition and command execution
pub mod cli;

/// Stage orchestration
pub mod collector;

/// HTTP fetching and response parsing
pub mod fetcher;

/// Metrics collection
pub mod metrics;

/// Record persistence
pub mod output;

/// Runtime configuration
pub mod settings;

/// Graceful shutdown coordination
pub mod shutdown;

/// One game on a user's profile.
///
/// Created from a listing page with only the identifying fields set, then
/// enriched once from the game's log page. Optional fields that were not
/// found are left out of the serialized form entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    /// Profile owner
    pub username: String,
    /// Catalog identifier of the game
    pub game_id: u64,
    /// Site slug used in the log page URL
    pub slug: String,
    /// User's rating on the site's 0-10 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    /// Play status ("Played", "Completed", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Hours played, rounded to 2 decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_played: Option<f64>,
    /// Platforms the game was played on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms_played: Option<Vec<String>>,
}

impl LogEntry {
    /// New stub with no rating or detail fields
    pub fn new(username: impl Into<String>, game_id: u64, slug: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            game_id,
            slug: slug.into(),
            user_rating: None,
            status: None,
            hours_played: None,
            platforms_played: None,
        }
    }

    /// Set the user rating
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.user_rating = Some(rating);
        self
    }

    /// Merge detail-page fields into this entry
    pub fn merge_details(&mut self, details: DetailFields) {
        self.status = details.status;
        self.hours_played = details.hours_played;
        self.platforms_played = details.platforms;
    }
}

/// Fields scraped from a single game's log page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    /// Play status
    pub status: Option<String>,
    /// Hours played
    pub hours_played: Option<f64>,
    /// Platforms, ordered and without duplicates
    pub platforms: Option<Vec<String>>,
}

/// Catalog metadata for one game
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    /// Catalog identifier, the join key back to [`LogEntry::game_id`]
    pub game_id: u64,
    /// Game title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Year of first release (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    /// Genre names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    /// Developer company names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developers: Option<Vec<String>>,
    /// Publisher company names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishers: Option<Vec<String>>,
    /// Platform names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    /// Collection / series names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<String>>,
}
