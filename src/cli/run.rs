//! Harvest command implementation

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use super::CliError;
use crate::collector::config::{
    Backoff, RetryPolicy, CATALOG_CONCURRENCY, CATALOG_LIMIT, CATALOG_MAX_RETRIES,
    DETAIL_CONCURRENCY, MAX_BACKOFF_MS, PAGE_CONCURRENCY, SITE_BACKOFF_MS, SITE_MAX_RETRIES,
};
use crate::collector::{CollectError, Pipeline, RunSummary};
use crate::fetcher::transport::ReqwestTransport;
use crate::metrics::init_metrics;
use crate::output::json::JsonSaver;
use crate::settings::{Credentials, Settings, DEFAULT_CATALOG_URL, DEFAULT_SITE_URL};
use crate::shutdown::SharedShutdown;

/// 429 backoff schedule selectable per host
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffMode {
    /// Same wait before every retry (60s site, 1s catalog)
    Fixed,
    /// Doubling wait from 1s, capped at the host's limit
    Exponential,
}

impl BackoffMode {
    /// Apply this schedule to `policy`, capping exponential waits at `cap`
    pub fn apply(self, policy: RetryPolicy, cap: Duration) -> RetryPolicy {
        match self {
            BackoffMode::Fixed => policy,
            BackoffMode::Exponential => policy.with_backoff(Backoff::exponential(cap)),
        }
    }
}

/// Collect a user's game logs and look the games up in the catalog
///
/// Every tunable can also be set through the `GAMELOG_*` variable named in
/// its help text.
#[derive(Parser, Debug)]
#[command(name = "gamelog-harvester", version, about)]
pub struct Cli {
    /// Profile to collect; prompted for on stdin when omitted
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Directory for `<username>_logs.json` and `<username>_games.json`
    #[arg(long, short = 'o', env = "GAMELOG_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Abort the whole run after this many seconds (0 disables)
    #[arg(long, env = "GAMELOG_DEADLINE_SECS", default_value_t = 0)]
    pub deadline_secs: u64,

    /// Ids per catalog request (1-500)
    #[arg(
        long,
        env = "GAMELOG_CHUNK_SIZE",
        default_value_t = CATALOG_LIMIT as u64,
        value_parser = clap::value_parser!(u64).range(1..=CATALOG_LIMIT as u64)
    )]
    pub chunk_size: u64,

    /// Profile site root
    #[arg(long, env = "GAMELOG_SITE_URL", default_value = DEFAULT_SITE_URL)]
    pub site_url: String,

    /// Catalog games endpoint
    #[arg(long, env = "GAMELOG_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Listing pages fetched at once
    #[arg(long, env = "GAMELOG_PAGE_CONCURRENCY", default_value_t = PAGE_CONCURRENCY)]
    pub page_concurrency: usize,

    /// Log pages fetched at once
    #[arg(long, env = "GAMELOG_DETAIL_CONCURRENCY", default_value_t = DETAIL_CONCURRENCY)]
    pub detail_concurrency: usize,

    /// Catalog requests in flight at once
    #[arg(long, env = "GAMELOG_CATALOG_CONCURRENCY", default_value_t = CATALOG_CONCURRENCY)]
    pub catalog_concurrency: usize,

    /// 429 retries per profile site request
    #[arg(long, env = "GAMELOG_SITE_MAX_RETRIES", default_value_t = SITE_MAX_RETRIES)]
    pub site_max_retries: u32,

    /// 429 retries per catalog request
    #[arg(long, env = "GAMELOG_CATALOG_MAX_RETRIES", default_value_t = CATALOG_MAX_RETRIES)]
    pub catalog_max_retries: u32,

    /// Wait schedule after a 429 from the profile site
    #[arg(long, env = "GAMELOG_SITE_BACKOFF", value_enum, default_value_t = BackoffMode::Fixed)]
    pub site_backoff: BackoffMode,

    /// Wait schedule after a 429 from the catalog API
    #[arg(long, env = "GAMELOG_CATALOG_BACKOFF", value_enum, default_value_t = BackoffMode::Fixed)]
    pub catalog_backoff: BackoffMode,

    /// Serve Prometheus metrics on this address during the run
    #[arg(long, env = "GAMELOG_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Build run settings from these options and `credentials`
    pub fn settings(&self, credentials: Credentials) -> Result<Settings, CliError> {
        let mut settings = Settings::new(credentials);
        settings.site_url = self.site_url.trim_end_matches('/').to_string();
        settings.catalog_url = self.catalog_url.clone();
        settings.output_dir = self.output_dir.clone();
        settings.run_deadline =
            (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs));
        settings.chunk_size = usize::try_from(self.chunk_size).map_err(|_| {
            CliError::InvalidArgument(format!("chunk size {} too large", self.chunk_size))
        })?;
        settings.page_concurrency = self.page_concurrency;
        settings.detail_concurrency = self.detail_concurrency;
        settings.catalog_concurrency = self.catalog_concurrency;

        let site_cap = Duration::from_millis(SITE_BACKOFF_MS);
        settings.site_retry = self
            .site_backoff
            .apply(settings.site_retry, site_cap)
            .with_max_retries(self.site_max_retries);
        settings.detail_retry = self
            .site_backoff
            .apply(settings.detail_retry, site_cap)
            .with_max_retries(self.site_max_retries);
        settings.catalog_retry = self
            .catalog_backoff
            .apply(settings.catalog_retry, Duration::from_millis(MAX_BACKOFF_MS))
            .with_max_retries(self.catalog_max_retries);

        settings.validate()?;
        Ok(settings)
    }

    /// Run the harvest end to end
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<RunSummary, CliError> {
        let settings = self.settings(Credentials::from_env()?)?;

        if let Some(addr) = self.metrics_addr {
            init_metrics(addr).map_err(|e| CliError::MetricsError(e.to_string()))?;
            info!(addr = %addr, "Metrics exporter listening");
        }

        let username = match &self.username {
            Some(name) => normalize_username(name)?,
            None => {
                prompt_username(BufReader::new(tokio::io::stdin()), tokio::io::stderr()).await?
            }
        };

        let transport = ReqwestTransport::new(settings.connect_timeout, settings.request_timeout)
            .map_err(CollectError::from)?;
        let sink = JsonSaver::new(&settings.output_dir);

        let summary = Pipeline::new(settings, Arc::new(transport), sink)
            .with_shutdown(shutdown)
            .run(&username)
            .await?;
        Ok(summary)
    }
}

/// Trim a username and reject empty ones
pub fn normalize_username(raw: &str) -> Result<String, CliError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CliError::InvalidArgument("username must not be empty".to_string()));
    }
    Ok(name.to_string())
}

/// Ask for a username on `writer` and read one line from `reader`
pub async fn prompt_username<R, W>(mut reader: R, mut writer: W) -> Result<String, CliError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(b"Username: ").await?;
    writer.flush().await?;

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    normalize_username(&line)
}
