//! HTTP plumbing: request types, the transport seam, and response parsers

use async_trait::async_trait;
use std::fmt;

pub mod catalog_parser;
pub mod http;
pub mod pagination;
pub mod profile_parser;
pub mod retry_formatter;
pub mod transport;

/// Fetcher errors
///
/// Every variant is fatal for the request that produced it. Throttling (429)
/// is retried inside [`http::RateLimitedFetcher`] and only surfaces as
/// [`FetcherError::RetriesExhausted`] once the retry ceiling is reached.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Resource does not exist (404)
    #[error("resource not found: {url}")]
    NotFound {
        /// Requested URL
        url: String,
    },

    /// Request rejected by the server (400, 401, 403)
    #[error("request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, usually an error description
        body: String,
    },

    /// Any other non-success status
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Still throttled after the configured number of retries
    #[error("still rate limited after {attempts} attempts: {url}")]
    RetriesExhausted {
        /// Total attempts made, including the first
        attempts: u32,
        /// Requested URL
        url: String,
    },

    /// Connection, DNS, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// HTTP method subset used by the collectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A single outbound request, replayable on retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Extra headers as name/value pairs
    pub headers: Vec<(String, String)>,
    /// Text body for POST requests
    pub body: Option<String>,
}

impl FetchRequest {
    /// Build a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Build a POST request with a text body
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Body as text
    pub body: String,
}

impl RawResponse {
    /// Convenience constructor
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The HTTP collaborator
///
/// Implementations perform exactly one exchange per call and never retry;
/// status classification and retries belong to [`http::RateLimitedFetcher`].
/// A transport error means no status was received.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request
    async fn execute(&self, request: &FetchRequest) -> FetcherResult<RawResponse>;
}
