//! Stage orchestration
//!
//! This module sequences the two collection stages and owns the error
//! taxonomy the run ends with.
//!
//! # Overview
//!
//! 1. [`profile::ProfileCollector`] discovers the listing's pages, extracts
//!    [`crate::LogEntry`] stubs and merges each game's log page into its stub
//! 2. [`catalog::CatalogCollector`] looks the game ids up in chunked batches
//! 3. [`pipeline::Pipeline`] runs both and hands the results to a
//!    [`crate::output::RecordSink`]
//!
//! Every fan-out goes through [`group::BoundedGroup`], which caps concurrency
//! per stage and cancels siblings on the first fatal error.
//!
//! # Error Handling
//!
//! - Throttling (429) is retried inside the fetcher and never reaches here
//!   unless the retry ceiling is hit
//! - Everything else becomes a [`CollectError`]; its [`FatalKind`] decides the
//!   process exit code
//! - Missing optional fields are not errors; they are left out of the records

pub mod catalog;
pub mod config;
pub mod group;
pub mod pipeline;
pub mod profile;

pub use catalog::CatalogCollector;
pub use group::BoundedGroup;
pub use pipeline::{Pipeline, RunSummary};
pub use profile::ProfileCollector;

use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// Fatal run errors
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The profile root returned 404
    #[error("profile '{username}' does not exist")]
    ProfileAbsent {
        /// Requested username
        username: String,
    },

    /// No games found across all listing pages
    #[error("profile '{username}' has no games")]
    EmptyProfile {
        /// Requested username
        username: String,
    },

    /// A page other than the profile root returned 404
    #[error("resource absent: {0}")]
    ResourceAbsent(String),

    /// The server refused the request (bad credentials or query)
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Server-provided explanation
        message: String,
    },

    /// A status outside the known contract
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Throttled past the retry ceiling
    #[error("rate limited after {attempts} attempts: {url}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Requested URL
        url: String,
    },

    /// A page or response did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// The run deadline elapsed
    #[error("run exceeded its deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),

    /// Shutdown was requested mid-run
    #[error("run cancelled by shutdown request")]
    Cancelled,

    /// Persisting results failed
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Result type for collection operations
pub type CollectResult<T> = Result<T, CollectError>;

impl From<FetcherError> for CollectError {
    fn from(err: FetcherError) -> Self {
        match err {
            FetcherError::NotFound { url } => CollectError::ResourceAbsent(url),
            FetcherError::Rejected { status, body } => CollectError::Rejected {
                status,
                message: body,
            },
            FetcherError::UnexpectedStatus { status, url } => {
                CollectError::UnexpectedStatus { status, url }
            }
            FetcherError::RetriesExhausted { attempts, url } => {
                CollectError::RetriesExhausted { attempts, url }
            }
            FetcherError::Network(msg) => CollectError::Network(msg),
            FetcherError::Parse(msg) => CollectError::MalformedResponse(msg),
        }
    }
}

/// Label for each way a run can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FatalKind {
    /// Profile root not found
    ProfileAbsent,
    /// Profile has no games
    EmptyProfile,
    /// Some other resource not found
    ResourceAbsent,
    /// Request rejected (400/401/403)
    Rejected,
    /// Unknown status code
    UnexpectedStatus,
    /// Retry ceiling reached
    RetriesExhausted,
    /// Unparseable page or response
    MalformedResponse,
    /// Transport failure
    Network,
    /// Run deadline elapsed
    DeadlineExceeded,
    /// Shutdown requested
    Cancelled,
    /// Persistence failure
    Output,
}

impl FatalKind {
    /// Distinct non-zero process exit code
    pub fn exit_code(self) -> i32 {
        match self {
            FatalKind::ProfileAbsent => 10,
            FatalKind::EmptyProfile => 11,
            FatalKind::ResourceAbsent => 12,
            FatalKind::Rejected => 20,
            FatalKind::UnexpectedStatus => 21,
            FatalKind::RetriesExhausted => 22,
            FatalKind::MalformedResponse => 23,
            FatalKind::Network => 24,
            FatalKind::DeadlineExceeded => 30,
            FatalKind::Cancelled => 130,
            FatalKind::Output => 40,
        }
    }

    /// Short snake_case label for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            FatalKind::ProfileAbsent => "profile_absent",
            FatalKind::EmptyProfile => "empty_profile",
            FatalKind::ResourceAbsent => "resource_absent",
            FatalKind::Rejected => "rejected",
            FatalKind::UnexpectedStatus => "unexpected_status",
            FatalKind::RetriesExhausted => "retries_exhausted",
            FatalKind::MalformedResponse => "malformed_response",
            FatalKind::Network => "network",
            FatalKind::DeadlineExceeded => "deadline_exceeded",
            FatalKind::Cancelled => "cancelled",
            FatalKind::Output => "output",
        }
    }
}

impl std::fmt::Display for FatalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CollectError {
    /// Which kind of fatal outcome this is
    pub fn kind(&self) -> FatalKind {
        match self {
            CollectError::ProfileAbsent { .. } => FatalKind::ProfileAbsent,
            CollectError::EmptyProfile { .. } => FatalKind::EmptyProfile,
            CollectError::ResourceAbsent(_) => FatalKind::ResourceAbsent,
            CollectError::Rejected { .. } => FatalKind::Rejected,
            CollectError::UnexpectedStatus { .. } => FatalKind::UnexpectedStatus,
            CollectError::RetriesExhausted { .. } => FatalKind::RetriesExhausted,
            CollectError::MalformedResponse(_) => FatalKind::MalformedResponse,
            CollectError::Network(_) => FatalKind::Network,
            CollectError::DeadlineExceeded(_) => FatalKind::DeadlineExceeded,
            CollectError::Cancelled => FatalKind::Cancelled,
            CollectError::Output(_) => FatalKind::Output,
        }
    }
}
