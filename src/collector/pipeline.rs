//! Pipeline driver
//!
//! Runs the profile stage, persists its logs, then runs the catalog stage over
//! the collected game ids and persists the records. Stages never overlap.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

use crate::collector::catalog::CatalogCollector;
use crate::collector::profile::ProfileCollector;
use crate::collector::{CollectError, CollectResult};
use crate::fetcher::Transport;
use crate::output::RecordSink;
use crate::settings::Settings;
use crate::shutdown::SharedShutdown;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Profile that was collected
    pub username: String,
    /// Log entries saved
    pub logs: usize,
    /// Catalog records saved
    pub games: usize,
    /// Where the log entries went
    pub log_path: PathBuf,
    /// Where the catalog records went
    pub games_path: PathBuf,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// Sequences both collectors and the sink for one username
pub struct Pipeline<S> {
    profile: ProfileCollector,
    catalog: CatalogCollector,
    sink: S,
    deadline: Option<Duration>,
    shutdown: Option<SharedShutdown>,
}

impl<S: RecordSink> Pipeline<S> {
    /// Build a pipeline; the transport is shared by every stage
    pub fn new(settings: Settings, transport: Arc<dyn Transport>, sink: S) -> Self {
        Self {
            profile: ProfileCollector::new(&settings, Arc::clone(&transport)),
            catalog: CatalogCollector::new(&settings, transport),
            sink,
            deadline: settings.run_deadline,
            shutdown: None,
        }
    }

    /// Cancel the run when `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Replace the run deadline
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Output file name for a user's log entries
    pub fn logs_name(username: &str) -> String {
        format!("{username}_logs")
    }

    /// Output file name for a user's catalog records
    pub fn games_name(username: &str) -> String {
        format!("{username}_games")
    }

    /// Collect and persist everything for `username`.
    ///
    /// The log file is written before the catalog stage starts, so a catalog
    /// failure still leaves it on disk. A stage that fails writes nothing.
    ///
    /// # Errors
    /// Any fatal [`CollectError`], plus [`CollectError::DeadlineExceeded`]
    /// when the run deadline elapses and [`CollectError::Cancelled`] when
    /// shutdown is requested.
    pub async fn run(&self, username: &str) -> CollectResult<RunSummary> {
        let run = self
            .run_stages(username)
            .instrument(info_span!("run", username = %username));

        let bounded = async {
            match self.deadline {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .unwrap_or_else(|_| Err(CollectError::DeadlineExceeded(limit))),
                None => run.await,
            }
        };

        let result = match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    biased;
                    _ = shutdown.wait_for_shutdown() => Err(CollectError::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        };

        if let Err(e) = &result {
            warn!(username = %username, kind = %e.kind(), error = %e, "Run failed");
        }
        result
    }

    async fn run_stages(&self, username: &str) -> CollectResult<RunSummary> {
        let started = Instant::now();
        info!(username = %username, "Collecting profile");

        let logs = self.profile.collect(username).await?;
        let log_path = self.sink.save(&Self::logs_name(username), &logs)?;

        let ids: Vec<u64> = logs.iter().map(|entry| entry.game_id).collect();
        let games = self.catalog.collect(&ids).await?;
        let games_path = self.sink.save(&Self::games_name(username), &games)?;

        let summary = RunSummary {
            username: username.to_string(),
            logs: logs.len(),
            games: games.len(),
            log_path,
            games_path,
            elapsed: started.elapsed(),
        };
        info!(
            username = %username,
            logs = summary.logs,
            games = summary.games,
            elapsed_ms = summary.elapsed.as_millis(),
            "Run complete"
        );
        Ok(summary)
    }
}
