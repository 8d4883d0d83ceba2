//! Runtime configuration
//!
//! [`Settings`] is built once at startup and handed to the pipeline by value;
//! nothing inside the collectors reads the environment. Credentials come from
//! `TOKEN` and `CLIENT_ID`. Tunables are command-line options, each with a
//! `GAMELOG_*` variable behind it (see [`crate::cli::Cli`]). The binary loads a
//! `.env` file first, so both may live there.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::collector::config::{
    RetryPolicy, CATALOG_CONCURRENCY, CATALOG_LIMIT, DETAIL_CONCURRENCY, PAGE_CONCURRENCY,
};
use crate::fetcher::transport::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS};

/// Default profile site root
pub const DEFAULT_SITE_URL: &str = "https://www.backloggd.com";

/// Default catalog games endpoint
pub const DEFAULT_CATALOG_URL: &str = "https://api.igdb.com/v4/games";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Required variable not set
    #[error("missing environment variable {0}")]
    MissingVariable(&'static str),

    /// Variable set to something unusable
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        /// Variable or option name
        name: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Catalog API credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    client_id: String,
}

impl Credentials {
    /// Create credentials from an access token and client id
    pub fn new(token: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client_id: client_id.into(),
        }
    }

    /// Read `TOKEN` and `CLIENT_ID` from the process environment
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read `TOKEN` and `CLIENT_ID` through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let token = lookup("TOKEN")
            .filter(|v| !v.trim().is_empty())
            .ok_or(SettingsError::MissingVariable("TOKEN"))?;
        let client_id = lookup("CLIENT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or(SettingsError::MissingVariable("CLIENT_ID"))?;
        Ok(Self::new(token.trim(), client_id.trim()))
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        if self.token.starts_with("Bearer ") {
            self.token.clone()
        } else {
            format!("Bearer {}", self.token)
        }
    }

    /// Value for the `Client-ID` header
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct Settings {
    /// Profile site root, without trailing slash
    pub site_url: String,
    /// Catalog games endpoint
    pub catalog_url: String,
    /// Catalog credentials
    pub credentials: Credentials,
    /// Concurrent listing page fetches
    pub page_concurrency: usize,
    /// Concurrent log page fetches
    pub detail_concurrency: usize,
    /// Concurrent catalog batch requests
    pub catalog_concurrency: usize,
    /// Ids per catalog request (1..=500)
    pub chunk_size: usize,
    /// Retry policy for listing pages
    pub site_retry: RetryPolicy,
    /// Retry policy for log pages
    pub detail_retry: RetryPolicy,
    /// Retry policy for catalog requests
    pub catalog_retry: RetryPolicy,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Optional limit on the whole run
    pub run_deadline: Option<Duration>,
    /// Directory for the JSON documents
    pub output_dir: PathBuf,
}

impl Settings {
    /// Defaults with the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            credentials,
            page_concurrency: PAGE_CONCURRENCY,
            detail_concurrency: DETAIL_CONCURRENCY,
            catalog_concurrency: CATALOG_CONCURRENCY,
            chunk_size: CATALOG_LIMIT,
            site_retry: RetryPolicy::site(),
            detail_retry: RetryPolicy::site_detail(),
            catalog_retry: RetryPolicy::catalog(),
            connect_timeout: Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
            run_deadline: None,
            output_dir: PathBuf::from("."),
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.chunk_size == 0 || self.chunk_size > CATALOG_LIMIT {
            return Err(SettingsError::InvalidValue {
                name: "chunk_size",
                value: self.chunk_size.to_string(),
                reason: format!("must be between 1 and {CATALOG_LIMIT}"),
            });
        }
        for (name, value) in [
            ("page_concurrency", self.page_concurrency),
            ("detail_concurrency", self.detail_concurrency),
            ("catalog_concurrency", self.catalog_concurrency),
        ] {
            if value == 0 {
                return Err(SettingsError::InvalidValue {
                    name,
                    value: value.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}
