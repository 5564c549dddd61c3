//! Concurrent tile dispatch with coordinator-owned cancellation.
//!
//! [`JobDispatcher::run`] fans one render task per tile out to a
//! [`WorkerPool`] of fixed size and waits for all of them. Interruption is
//! handled only here, in the coordinator:
//!
//! 1. the operator's interrupt trips a [`CancellationToken`];
//! 2. the coordinator stops submitting;
//! 3. the pool is terminated (workers aborted, engine children killed);
//! 4. [`DispatchError::Cancelled`] is returned so no manifest is written.
//!
//! Whatever the outcome, the pool is released before `run` returns.

mod config;
mod pool;
mod progress;

pub use config::{default_jobs, DispatchConfig, FailurePolicy};
pub use pool::WorkerPool;
pub use progress::{CountingProgress, DotProgress, NoProgress, ProgressSink};

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{RenderError, TileRenderer};
use crate::grid::Tile;

/// A tile whose render task failed.
#[derive(Debug, Error)]
#[error("tile {index}: {error}")]
pub struct TileFailure {
    pub index: u32,
    #[source]
    pub error: RenderError,
}

/// Errors that end a dispatch early.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The operator interrupted the run.
    #[error("Interrupted after {completed} of {total} tiles")]
    Cancelled { completed: usize, total: usize },

    /// A tile failed and the failure policy is [`FailurePolicy::Abort`].
    #[error("Engine failure on {0}")]
    EngineFailure(TileFailure),

    /// A worker task panicked.
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl DispatchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled { .. })
    }
}

/// Summary of a dispatch that ran to completion.
#[derive(Debug)]
pub struct DispatchReport {
    pub total: usize,
    pub rendered: usize,
    /// Tiles the engine failed on, sorted by index.
    pub failures: Vec<TileFailure>,
    pub elapsed: Duration,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Finished(Result<(), DispatchError>),
    Interrupted,
    Halted,
}

/// Dispatches render tasks for a set of tiles.
pub struct JobDispatcher<R: TileRenderer + ?Sized> {
    config: DispatchConfig,
    renderer: Arc<R>,
    progress: Arc<dyn ProgressSink>,
}

impl<R: TileRenderer + ?Sized> JobDispatcher<R> {
    pub fn new(config: DispatchConfig, renderer: Arc<R>) -> Self {
        Self {
            config,
            renderer,
            progress: Arc::new(NoProgress),
        }
    }

    /// Reports each finished tile to `progress`.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Renders every tile, at most `jobs` at a time.
    ///
    /// Tiles are submitted in the order given. `cancel` is observed while
    /// submitting and while waiting; once tripped, outstanding work is
    /// terminated and [`DispatchError::Cancelled`] is returned.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run(
        &self,
        tiles: &[Tile],
        cancel: &CancellationToken,
    ) -> Result<DispatchReport, DispatchError> {
        let start = Instant::now();
        let total = tiles.len();

        info!(
            tiles = total,
            jobs = self.config.jobs(),
            renderer = self.renderer.name(),
            "Dispatching tiles"
        );

        let mut pool = WorkerPool::start(
            &self.config,
            Arc::clone(&self.renderer),
            Arc::clone(&self.progress),
        );
        let halt = pool.halt_token();

        let outcome = self.drive(&mut pool, tiles, cancel, &halt).await;

        // Release the pool on every path before reporting.
        if !matches!(outcome, Outcome::Finished(Ok(()))) {
            pool.terminate().await;
        }
        self.progress.finish();
        debug_assert_eq!(pool.live_workers(), 0);

        let completed = pool.completed();
        let failures = pool.take_failures();

        match outcome {
            Outcome::Finished(Ok(())) => {
                let report = DispatchReport {
                    total,
                    rendered: completed - failures.len(),
                    failures,
                    elapsed: start.elapsed(),
                };
                info!(
                    rendered = report.rendered,
                    failed = report.failures.len(),
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Dispatch complete"
                );
                Ok(report)
            }
            Outcome::Finished(Err(e)) => {
                warn!(error = %e, "Dispatch failed");
                Err(e)
            }
            Outcome::Interrupted => {
                warn!(completed, total, "Dispatch interrupted");
                Err(DispatchError::Cancelled { completed, total })
            }
            Outcome::Halted => match failures.into_iter().next() {
                Some(first) => {
                    warn!(tile = first.index, "Dispatch halted by engine failure");
                    Err(DispatchError::EngineFailure(first))
                }
                None => Err(DispatchError::Worker(
                    "run halted without a recorded failure".to_string(),
                )),
            },
        }
    }

    async fn drive(
        &self,
        pool: &mut WorkerPool,
        tiles: &[Tile],
        cancel: &CancellationToken,
        halt: &CancellationToken,
    ) -> Outcome {
        for tile in tiles {
            if cancel.is_cancelled() {
                debug!(submitted = pool.submitted(), "Interrupted during submission");
                return Outcome::Interrupted;
            }
            if halt.is_cancelled() {
                return Outcome::Halted;
            }
            if !pool.submit(*tile) {
                return Outcome::Finished(Err(DispatchError::Worker(
                    "worker queue closed unexpectedly".to_string(),
                )));
            }
        }
        pool.close();
        debug!(submitted = pool.submitted(), "All tiles submitted");

        tokio::select! {
            biased;

            _ = cancel.cancelled() => Outcome::Interrupted,
            _ = halt.cancelled() => Outcome::Halted,
            result = pool.join() => Outcome::Finished(result),
        }
    }
}

#[cfg(test)]
mod tests;
