//! Fixed-size worker pool executing tile render tasks.
//!
//! ```text
//!                       ┌──────────── WorkerPool ─────────────┐
//!  submit(tile) ──────► │ queue ──► worker 0 ──► renderer     │
//!  (never blocks)       │       ──► worker 1 ──► renderer     │
//!                       │       ──► worker N ──► renderer     │
//!                       └─────────────────────────────────────┘
//! ```
//!
//! Workers are started up front and pull tiles from a shared queue until it
//! is closed and drained. They never look at the interrupt: the owner of the
//! pool either [`join`](WorkerPool::join)s them or
//! [`terminate`](WorkerPool::terminate)s them from outside.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::config::{DispatchConfig, FailurePolicy};
use super::progress::ProgressSink;
use super::{DispatchError, TileFailure};
use crate::engine::{TileRenderer, WorkerContext};
use crate::grid::Tile;

type SharedQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Tile>>>;

/// State shared between the pool owner and its workers.
struct Shared {
    completed: AtomicUsize,
    failures: Mutex<Vec<TileFailure>>,
    /// Tripped by a worker when a tile fails under [`FailurePolicy::Abort`].
    halt: CancellationToken,
}

/// A pool of pre-started workers owned by a single coordinator.
///
/// Dropping the pool aborts every worker that is still running.
pub struct WorkerPool {
    queue: Option<mpsc::UnboundedSender<Tile>>,
    workers: JoinSet<()>,
    shared: Arc<Shared>,
    submitted: usize,
}

impl WorkerPool {
    /// Starts `config.jobs()` workers on the current tokio runtime.
    pub fn start<R>(
        config: &DispatchConfig,
        renderer: Arc<R>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self
    where
        R: TileRenderer + ?Sized,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(tokio::sync::Mutex::new(rx));
        let shared = Arc::new(Shared {
            completed: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
            halt: CancellationToken::new(),
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..config.jobs() {
            let ctx = WorkerContext {
                worker_id,
                signals: config.worker_signals(),
            };
            workers.spawn(worker_loop(
                ctx,
                config.failure_policy(),
                Arc::clone(&queue),
                Arc::clone(&renderer),
                Arc::clone(&progress),
                Arc::clone(&shared),
            ));
        }

        debug!(workers = config.jobs(), "Worker pool started");

        Self {
            queue: Some(tx),
            workers,
            shared,
            submitted: 0,
        }
    }

    /// Queues a tile. Never blocks.
    ///
    /// Returns `false` if the pool has been closed.
    pub fn submit(&mut self, tile: Tile) -> bool {
        match &self.queue {
            Some(tx) if tx.send(tile).is_ok() => {
                self.submitted += 1;
                true
            }
            _ => false,
        }
    }

    /// Closes the queue; workers exit once it is drained.
    pub fn close(&mut self) {
        self.queue = None;
    }

    /// Waits for every worker to exit.
    ///
    /// Call [`close`](Self::close) first, or this waits forever.
    pub async fn join(&mut self) -> Result<(), DispatchError> {
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    self.workers.abort_all();
                    return Err(DispatchError::Worker(e.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Aborts every worker immediately and waits until they are gone.
    ///
    /// In-flight renders are dropped mid-task; queued tiles are discarded.
    pub async fn terminate(&mut self) {
        self.queue = None;
        self.workers.abort_all();
        while self.workers.join_next().await.is_some() {}
        debug!("Worker pool terminated");
    }

    /// Token tripped when a worker halts the run.
    pub fn halt_token(&self) -> CancellationToken {
        self.shared.halt.clone()
    }

    /// Number of worker tasks not yet joined.
    pub fn live_workers(&self) -> usize {
        self.workers.len()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Tiles whose render task has finished, successfully or not.
    pub fn completed(&self) -> usize {
        self.shared.completed.load(Ordering::SeqCst)
    }

    /// Takes the failures recorded so far, sorted by tile index.
    pub fn take_failures(&self) -> Vec<TileFailure> {
        let mut failures = match self.shared.failures.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        failures.sort_by_key(|f| f.index);
        failures
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            trace!(live = self.workers.len(), "Aborting workers on drop");
            self.workers.abort_all();
        }
    }
}

async fn worker_loop<R>(
    ctx: WorkerContext,
    policy: FailurePolicy,
    queue: SharedQueue,
    renderer: Arc<R>,
    progress: Arc<dyn ProgressSink>,
    shared: Arc<Shared>,
) where
    R: TileRenderer + ?Sized,
{
    loop {
        // The lock is released before rendering so other workers can pull.
        let next = queue.lock().await.recv().await;
        let Some(tile) = next else {
            break;
        };

        let result = renderer.render(&tile, &ctx).await;
        let ok = result.is_ok();

        if let Err(error) = result {
            warn!(
                worker = ctx.worker_id,
                tile = tile.index,
                error = %error,
                "Tile render failed"
            );
            if let Ok(mut failures) = shared.failures.lock() {
                failures.push(TileFailure {
                    index: tile.index,
                    error,
                });
            }
            if policy == FailurePolicy::Abort {
                shared.halt.cancel();
            }
        }

        shared.completed.fetch_add(1, Ordering::SeqCst);
        progress.tile_finished(&tile, ok);
    }

    trace!(worker = ctx.worker_id, "Worker exiting");
}
