//! Dispatcher tests using in-process mock renderers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::engine::{RenderFuture, WorkerContext};
use crate::grid::{Bounds, Grid, Partition, Point};

fn tiles(size: u32) -> Vec<Tile> {
    let bounds = Bounds::new(Point::new(-2.0, -1.5), Point::new(1.0, 1.5)).unwrap();
    Partition::new(bounds, Grid::new(size, 16).unwrap()).tiles()
}

/// Decrements the in-flight counter when a render future is dropped,
/// whether it completed or was aborted.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct MockRenderer {
    delay: Duration,
    fail_on: HashSet<u32>,
    /// Cancel this token once this many tiles have started.
    cancel_after: Option<(usize, CancellationToken)>,
    /// Never finish tiles after the cancel point.
    hang_after_cancel: bool,
    panic_on: Option<u32>,
    started: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
    rendered: Mutex<Vec<u32>>,
    workers_seen: Mutex<HashSet<usize>>,
}

impl MockRenderer {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

impl TileRenderer for MockRenderer {
    fn render<'a>(&'a self, tile: &'a Tile, ctx: &'a WorkerContext) -> RenderFuture<'a> {
        Box::pin(async move {
            let _guard = InFlight::enter(&self.in_flight, &self.peak);
            self.workers_seen.lock().unwrap().insert(ctx.worker_id);
            let started = self.started.fetch_add(1, Ordering::SeqCst) + 1;

            if self.panic_on == Some(tile.index) {
                panic!("mock renderer panic on tile {}", tile.index);
            }

            if let Some((after, token)) = &self.cancel_after {
                if started >= *after {
                    token.cancel();
                    if self.hang_after_cancel {
                        std::future::pending::<()>().await;
                    }
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if self.fail_on.contains(&tile.index) {
                return Err(RenderError::Other {
                    index: tile.index,
                    reason: "mock failure".to_string(),
                });
            }

            self.rendered.lock().unwrap().push(tile.index);
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn dispatcher(jobs: usize, renderer: &Arc<MockRenderer>) -> JobDispatcher<MockRenderer> {
    JobDispatcher::new(DispatchConfig::new(jobs).unwrap(), Arc::clone(renderer))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_renders_every_tile_once() {
    let renderer = Arc::new(MockRenderer::with_delay(Duration::from_millis(1)));
    let progress = Arc::new(CountingProgress::new());
    let dispatcher = dispatcher(4, &renderer).with_progress(progress.clone());

    let tiles = tiles(8);
    let report = dispatcher
        .run(&tiles, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total, 64);
    assert_eq!(report.rendered, 64);
    assert!(report.is_complete());
    assert_eq!(progress.ok(), 64);

    let mut rendered = renderer.rendered.lock().unwrap().clone();
    rendered.sort_unstable();
    assert_eq!(rendered, (1..=64).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_is_bounded_by_jobs() {
    let renderer = Arc::new(MockRenderer::with_delay(Duration::from_millis(5)));
    let dispatcher = dispatcher(3, &renderer);

    dispatcher
        .run(&tiles(4), &CancellationToken::new())
        .await
        .unwrap();

    let peak = renderer.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {} exceeds 3 jobs", peak);
    assert!(peak >= 2, "expected workers to overlap, peak was {}", peak);
    assert!(renderer.workers_seen.lock().unwrap().iter().all(|w| *w < 3));
}

#[tokio::test]
async fn test_single_worker_renders_in_submission_order() {
    let renderer = Arc::new(MockRenderer::default());
    let dispatcher = dispatcher(1, &renderer);

    dispatcher
        .run(&tiles(4), &CancellationToken::new())
        .await
        .unwrap();

    let rendered = renderer.rendered.lock().unwrap().clone();
    assert_eq!(rendered, (1..=16).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_cancelled_before_submission() {
    let renderer = Arc::new(MockRenderer::default());
    let dispatcher = dispatcher(2, &renderer);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = dispatcher.run(&tiles(4), &cancel).await.unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Cancelled {
            completed: 0,
            total: 16
        }
    ));
    assert_eq!(renderer.started.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_terminates_in_flight_work() {
    let cancel = CancellationToken::new();
    let renderer = Arc::new(MockRenderer {
        cancel_after: Some((3, cancel.clone())),
        hang_after_cancel: true,
        ..Default::default()
    });
    let progress = Arc::new(CountingProgress::new());
    let dispatcher = dispatcher(4, &renderer).with_progress(progress.clone());

    let result = tokio::time::timeout(Duration::from_secs(10), dispatcher.run(&tiles(8), &cancel))
        .await
        .expect("dispatch must not hang after cancellation");

    match result {
        Err(DispatchError::Cancelled { completed, total }) => {
            assert_eq!(total, 64);
            assert!(completed < total);
            assert_eq!(completed, progress.total());
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
    // Every hung render was dropped by the pool.
    assert_eq!(renderer.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_during_submission_of_large_grid() {
    let cancel = CancellationToken::new();
    let renderer = Arc::new(MockRenderer {
        cancel_after: Some((1, cancel.clone())),
        hang_after_cancel: true,
        ..Default::default()
    });
    let dispatcher = dispatcher(2, &renderer);

    let err = dispatcher.run(&tiles(64), &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(renderer.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_record_policy_reports_failures() {
    let renderer = Arc::new(MockRenderer {
        fail_on: [3, 7].into_iter().collect(),
        ..Default::default()
    });
    let progress = Arc::new(CountingProgress::new());
    let dispatcher = dispatcher(2, &renderer).with_progress(progress.clone());

    let report = dispatcher
        .run(&tiles(4), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.rendered, 14);
    let failed: Vec<u32> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![3, 7]);
    assert_eq!(progress.failed(), 2);
}

#[tokio::test]
async fn test_abort_policy_stops_on_first_failure() {
    let renderer = Arc::new(MockRenderer {
        fail_on: [2].into_iter().collect(),
        delay: Duration::from_millis(1),
        ..Default::default()
    });
    let config = DispatchConfig::new(1)
        .unwrap()
        .with_failure_policy(FailurePolicy::Abort);
    let dispatcher = JobDispatcher::new(config, Arc::clone(&renderer));

    let err = dispatcher
        .run(&tiles(4), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        DispatchError::EngineFailure(failure) => assert_eq!(failure.index, 2),
        other => panic!("expected engine failure, got {:?}", other),
    }
    assert!(renderer.started.load(Ordering::SeqCst) < 16);
}

#[tokio::test]
async fn test_worker_panic_is_reported() {
    let renderer = Arc::new(MockRenderer {
        panic_on: Some(5),
        ..Default::default()
    });
    let dispatcher = dispatcher(2, &renderer);

    let err = dispatcher
        .run(&tiles(4), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Worker(_)));
    assert_eq!(renderer.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_pool_close_and_join_releases_workers() {
    let renderer = Arc::new(MockRenderer::default());
    let config = DispatchConfig::new(3).unwrap();
    let mut pool = WorkerPool::start(&config, renderer, Arc::new(NoProgress));

    assert_eq!(pool.live_workers(), 3);
    for tile in tiles(2) {
        assert!(pool.submit(tile));
    }
    pool.close();
    assert!(!pool.submit(tiles(2)[0]));

    pool.join().await.unwrap();
    assert_eq!(pool.live_workers(), 0);
    assert_eq!(pool.submitted(), 4);
    assert_eq!(pool.completed(), 4);
}
