//! Concurrency-capped fan-out/fan-in for one pipeline stage
//!
//! A [`BoundedGroup`] drives any number of futures on the caller's task,
//! admitting at most `max_concurrency` of them into their bodies at once.
//! Admission goes through a fair (FIFO) semaphore; the permit is an RAII
//! guard, so a slot is released when a task finishes, fails, or is dropped.
//!
//! The first task error is fatal for the whole group: every queued and
//! in-flight sibling is dropped before the error is handed back.

use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Bounded task group for a single stage
#[derive(Debug, Clone)]
pub struct BoundedGroup {
    stage: &'static str,
    max_concurrency: usize,
}

impl BoundedGroup {
    /// Create a group for `stage`. A `max_concurrency` of zero means no cap.
    pub fn new(stage: &'static str, max_concurrency: usize) -> Self {
        Self {
            stage,
            max_concurrency,
        }
    }

    /// Create a group without a concurrency cap
    pub fn unbounded(stage: &'static str) -> Self {
        Self::new(stage, 0)
    }

    /// Concurrency cap, or `None` when unbounded
    pub fn max_concurrency(&self) -> Option<usize> {
        (self.max_concurrency > 0).then_some(self.max_concurrency)
    }

    /// Run every task and collect their outputs in completion order.
    ///
    /// Returns the first error any task produces. By then all other tasks
    /// have been cancelled, so nothing launched here outlives this call.
    pub async fn run<I, Fut, T, E>(&self, tasks: I) -> Result<Vec<T>, E>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let started = Instant::now();
        // Declared before `in_flight` so the tasks borrowing it drop first.
        let gate = self.max_concurrency().map(Semaphore::new);
        let gate = gate.as_ref();

        let mut in_flight: FuturesUnordered<_> = tasks
            .into_iter()
            .map(|task| async move {
                // The gate is never closed, so acquire only fails if it were.
                let _permit = match gate {
                    Some(gate) => gate.acquire().await.ok(),
                    None => None,
                };
                task.await
            })
            .collect();

        let total = in_flight.len();
        debug!(
            stage = self.stage,
            tasks = total,
            max_concurrency = self.max_concurrency,
            "Starting bounded group"
        );

        let mut outputs = Vec::with_capacity(total);
        while let Some(result) = in_flight.next().await {
            match result {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    let cancelled = in_flight.len();
                    drop(in_flight);
                    warn!(
                        stage = self.stage,
                        completed = outputs.len(),
                        cancelled = cancelled,
                        error = %e,
                        "Fatal task error, cancelled remaining tasks"
                    );
                    return Err(e);
                }
            }
        }

        debug!(
            stage = self.stage,
            tasks = total,
            elapsed_ms = started.elapsed().as_millis(),
            "Bounded group completed"
        );
        Ok(outputs)
    }
}
