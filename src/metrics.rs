//! Run metrics
//!
//! Counters and histograms are recorded through the `metrics` facade at every
//! HTTP exchange, retry and stage boundary. Without an installed recorder the
//! macros are no-ops; [`init_metrics`] installs a Prometheus scrape endpoint.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

/// Correlation ID generator for request tracing
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok(())` without rebinding.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut initialized = METRICS_INITIALIZED
        .lock()
        .map_err(|_| "metrics init lock poisoned")?;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests by fetcher and status"
    );
    describe_counter!(
        "http_429_errors_total",
        Unit::Count,
        "Total number of 429 rate limit responses received"
    );
    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Total number of retry attempts"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );
    describe_counter!(
        "stages_completed_total",
        Unit::Count,
        "Pipeline stages that completed"
    );
    describe_counter!(
        "stages_failed_total",
        Unit::Count,
        "Pipeline stages that failed fatally"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Generate a new correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Timing and outcome of one HTTP attempt
pub struct HttpRequestMetrics {
    fetcher: &'static str,
    start_time: Instant,
    correlation_id: String,
    attempt: u32,
}

impl HttpRequestMetrics {
    /// Start recording a new HTTP attempt
    pub fn start(fetcher: &'static str, attempt: u32) -> Self {
        let correlation_id = generate_correlation_id();
        debug!(
            correlation_id = %correlation_id,
            fetcher = fetcher,
            attempt = attempt,
            "Starting HTTP request"
        );
        Self {
            fetcher,
            start_time: Instant::now(),
            correlation_id,
            attempt,
        }
    }

    /// Record completion with a status code
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "fetcher" => self.fetcher,
            "status" => status_code.to_string(),
        )
        .increment(1);
        histogram!("http_request_duration_seconds", "fetcher" => self.fetcher)
            .record(duration.as_secs_f64());

        if status_code == 429 {
            counter!("http_429_errors_total", "fetcher" => self.fetcher).increment(1);
            warn!(
                correlation_id = %self.correlation_id,
                fetcher = self.fetcher,
                attempt = self.attempt,
                duration_ms = duration.as_millis(),
                "Rate limit error (429) recorded"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            fetcher = self.fetcher,
            status = status_code,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    /// Record a transport failure (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();
        counter!(
            "http_requests_total",
            "fetcher" => self.fetcher,
            "status" => "network_error",
        )
        .increment(1);
        warn!(
            correlation_id = %self.correlation_id,
            fetcher = self.fetcher,
            attempt = self.attempt,
            duration_ms = duration.as_millis(),
            "Network error recorded"
        );
    }

    /// Correlation ID for this attempt
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Record a retry backoff
pub fn record_retry_backoff(fetcher: &'static str, duration: Duration, attempt: u32) {
    counter!("http_retries_total", "fetcher" => fetcher).increment(1);
    histogram!("retry_backoff_duration_seconds", "fetcher" => fetcher)
        .record(duration.as_secs_f64());
    debug!(
        fetcher = fetcher,
        attempt = attempt,
        backoff_ms = duration.as_millis(),
        "Retry backoff recorded"
    );
}

/// Outcome tracking for one pipeline stage
pub struct StageMetrics {
    stage: &'static str,
    start_time: Instant,
}

impl StageMetrics {
    /// Start tracking a stage
    pub fn start(stage: &'static str) -> Self {
        info!(stage = stage, "Stage started");
        Self {
            stage,
            start_time: Instant::now(),
        }
    }

    /// Record successful completion
    pub fn record_success(&self, items_count: usize) {
        counter!("stages_completed_total", "stage" => self.stage).increment(1);
        info!(
            stage = self.stage,
            items_count = items_count,
            duration_ms = self.start_time.elapsed().as_millis(),
            "Stage completed"
        );
    }

    /// Record a fatal failure
    pub fn record_failure(&self, error: &str) {
        counter!("stages_failed_total", "stage" => self.stage).increment(1);
        error!(
            stage = self.stage,
            error = %error,
            duration_ms = self.start_time.elapsed().as_millis(),
            "Stage failed"
        );
    }
}
