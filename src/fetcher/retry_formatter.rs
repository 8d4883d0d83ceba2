//! Retry and failure message formatting for [`super::http::RateLimitedFetcher`].
//!
//! Classifies a response status into a [`RetryErrorType`] and renders
//! consistent log lines for throttled attempts, recoveries and final failures.

use std::time::Duration;

/// Classification of a failed exchange for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// HTTP 429 rate limit exceeded
    RateLimit,
    /// HTTP 404, the resource does not exist
    NotFound,
    /// HTTP 400 malformed request
    InvalidRequest,
    /// Authentication failures (401/403)
    AuthFailed(u16),
    /// Any other non-success status
    Unexpected(u16),
    /// No status received (connect, DNS, timeout)
    Network,
}

impl RetryErrorType {
    /// User-friendly description string used inside log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate limit exceeded",
            Self::NotFound => "resource not found",
            Self::InvalidRequest => "invalid request",
            Self::AuthFailed(code) => match code {
                401 => "authentication failed (401)",
                403 => "authentication failed (403)",
                _ => "authentication failed",
            },
            Self::Unexpected(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "unexpected status",
            },
            Self::Network => "network error",
        }
    }

    /// Suggested remediation shown with the final failure.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::RateLimit => "Wait a few minutes before running again",
            Self::NotFound => "Check the username spelling; profiles are case sensitive",
            Self::InvalidRequest => "The catalog query was refused; check the requested fields",
            Self::AuthFailed(_) => "Verify TOKEN and CLIENT_ID in your environment or .env file",
            Self::Unexpected(_) => "The remote service may be having issues, try again later",
            Self::Network => "Check network connectivity and try again",
        }
    }

    /// Only throttling is retried; everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered the message
    pub error_type: RetryErrorType,
    /// Backoff duration until next attempt
    pub backoff_duration: Duration,
    /// Fetcher label, e.g. "site" or "catalog"
    pub fetcher: String,
    /// Original error message for details
    pub error_message: String,
    /// URL that failed
    pub endpoint: String,
}

impl RetryContext {
    /// Convenience constructor used throughout the retry logic.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error_type: RetryErrorType,
        backoff_duration: Duration,
        fetcher: impl Into<String>,
        error_message: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type,
            backoff_duration,
            fetcher: fetcher.into(),
            error_message: error_message.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Format standardized retry message with attempt counters and context.
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds... [{}] {}",
            self.attempt,
            self.max_attempts,
            self.error_type.description(),
            self.backoff_duration.as_secs_f64(),
            self.fetcher,
            self.endpoint
        )
    }

    /// Format message when an attempt succeeds after earlier throttling.
    pub fn format_success(&self) -> String {
        format!(
            "Retry attempt {}/{} succeeded [{}] {}",
            self.attempt, self.max_attempts, self.fetcher, self.endpoint
        )
    }

    /// Format final failure summary with actionable suggestions.
    pub fn format_failure(&self) -> String {
        let mut lines = vec![
            format!("[FAILED] Request failed after {} attempt(s)", self.attempt),
            format!("  Last error: {}", self.error_message),
            format!("  Fetcher: {}", self.fetcher),
            format!("  Endpoint: {}", self.endpoint),
            "  Suggestions:".to_string(),
        ];
        for suggestion in self.format_suggestions() {
            lines.push(format!("    - {suggestion}"));
        }
        lines.join("\n")
    }

    /// Derive suggestions tailored to the current context.
    pub fn format_suggestions(&self) -> Vec<String> {
        let mut suggestions = vec![self.error_type.suggestion().to_string()];
        if self.error_type == RetryErrorType::RateLimit {
            suggestions.push(format!(
                "Raise the retry ceiling (current: {} attempts)",
                self.max_attempts
            ));
        }
        suggestions
    }
}

/// Extract a [`RetryErrorType`] from an HTTP status, `None` meaning no response.
pub fn extract_error_type(status: Option<u16>) -> RetryErrorType {
    match status {
        Some(400) => RetryErrorType::InvalidRequest,
        Some(code @ (401 | 403)) => RetryErrorType::AuthFailed(code),
        Some(404) => RetryErrorType::NotFound,
        Some(429) => RetryErrorType::RateLimit,
        Some(code) => RetryErrorType::Unexpected(code),
        None => RetryErrorType::Network,
    }
}
