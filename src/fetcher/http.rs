//! Rate-limit aware fetch primitive
//!
//! [`RateLimitedFetcher`] wraps a [`Transport`] with status classification
//! and a bounded retry loop for HTTP 429. Each instance carries its own
//! [`RetryPolicy`], which is how the site scraper gets a long backoff and the
//! catalog client a short one while sharing this code.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::collector::config::RetryPolicy;
use crate::fetcher::retry_formatter::{extract_error_type, RetryContext, RetryErrorType};
use crate::fetcher::{FetchRequest, FetcherError, FetcherResult, Transport};
use crate::metrics::{record_retry_backoff, HttpRequestMetrics};

/// HTTP fetcher with 429 retry and fatal status classification
#[derive(Clone)]
pub struct RateLimitedFetcher {
    label: &'static str,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RateLimitedFetcher {
    /// Create a fetcher
    ///
    /// # Arguments
    /// * `label` - Name used in logs and metrics (e.g. "site", "catalog")
    /// * `transport` - Shared HTTP collaborator
    /// * `policy` - Retry ceiling, backoff schedule and post-success pacing
    pub fn new(label: &'static str, transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            label,
            transport,
            policy,
        }
    }

    /// Fetcher label
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Total attempts allowed per request
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_retries.saturating_add(1)
    }

    /// GET `url` and return the body
    pub async fn get(&self, url: &str) -> FetcherResult<String> {
        self.fetch(&FetchRequest::get(url)).await
    }

    /// Issue `request` until it succeeds, fails fatally, or exhausts retries.
    ///
    /// - 200: body returned, then the policy's pacing delay is applied
    /// - 429: sleep per the backoff schedule and retry the same request
    /// - 404: [`FetcherError::NotFound`], no retry
    /// - 400/401/403: [`FetcherError::Rejected`], no retry
    /// - anything else: [`FetcherError::UnexpectedStatus`], no retry
    pub async fn fetch(&self, request: &FetchRequest) -> FetcherResult<String> {
        let max_attempts = self.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let request_metrics = HttpRequestMetrics::start(self.label, attempt);

            let response = match self.transport.execute(request).await {
                Ok(response) => response,
                Err(e) => {
                    request_metrics.record_network_error();
                    let ctx = self.context(attempt, RetryErrorType::Network, &e, request);
                    error!("{}", ctx.format_failure());
                    return Err(e);
                }
            };
            request_metrics.record_complete(response.status);

            if response.status == 200 {
                if attempt > 1 {
                    let ctx = RetryContext::new(
                        attempt,
                        max_attempts,
                        RetryErrorType::RateLimit,
                        Default::default(),
                        self.label,
                        "",
                        &request.url,
                    );
                    info!("{}", ctx.format_success());
                }
                debug!(
                    fetcher = self.label,
                    url = %request.url,
                    attempt = attempt,
                    bytes = response.body.len(),
                    "Fetch succeeded"
                );
                if !self.policy.pacing.is_zero() {
                    tokio::time::sleep(self.policy.pacing).await;
                }
                return Ok(response.body);
            }

            let error_type = extract_error_type(Some(response.status));
            if error_type.is_retryable() {
                if attempt >= max_attempts {
                    let err = FetcherError::RetriesExhausted {
                        attempts: attempt,
                        url: request.url.clone(),
                    };
                    let ctx = self.context(attempt, error_type, &err, request);
                    error!("{}", ctx.format_failure());
                    return Err(err);
                }

                let backoff = self.policy.backoff.delay(attempt - 1);
                let ctx = RetryContext::new(
                    attempt,
                    max_attempts,
                    error_type,
                    backoff,
                    self.label,
                    format!("HTTP {}", response.status),
                    &request.url,
                );
                warn!("{}", ctx.format_retry());
                record_retry_backoff(self.label, backoff, attempt);
                tokio::time::sleep(backoff).await;
                continue;
            }

            let err = match error_type {
                RetryErrorType::NotFound => FetcherError::NotFound {
                    url: request.url.clone(),
                },
                RetryErrorType::InvalidRequest | RetryErrorType::AuthFailed(_) => {
                    FetcherError::Rejected {
                        status: response.status,
                        body: response.body,
                    }
                }
                _ => FetcherError::UnexpectedStatus {
                    status: response.status,
                    url: request.url.clone(),
                },
            };
            let ctx = self.context(attempt, error_type, &err, request);
            error!("{}", ctx.format_failure());
            return Err(err);
        }
    }

    fn context(
        &self,
        attempt: u32,
        error_type: RetryErrorType,
        err: &FetcherError,
        request: &FetchRequest,
    ) -> RetryContext {
        RetryContext::new(
            attempt,
            self.max_attempts(),
            error_type,
            Default::default(),
            self.label,
            err.to_string(),
            &request.url,
        )
    }
}
