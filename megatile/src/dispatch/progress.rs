//! Progress reporting for tile dispatch.
//!
//! Workers report every finished tile through a [`ProgressSink`]. The
//! default [`DotProgress`] prints one character per tile and flushes
//! immediately so the operator sees the run advance.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::grid::Tile;

/// Receives one event per finished tile, from any worker.
pub trait ProgressSink: Send + Sync {
    /// Called once per tile when its render task ends.
    fn tile_finished(&self, tile: &Tile, ok: bool);

    /// Called once when the dispatch ends, whatever the outcome.
    fn finish(&self) {}
}

/// Discards progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn tile_finished(&self, _tile: &Tile, _ok: bool) {}
}

/// Writes `.` for each rendered tile and `x` for each failed one.
pub struct DotProgress<W: Write + Send> {
    out: Mutex<W>,
}

impl DotProgress<io::Stdout> {
    /// Progress dots on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> DotProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ProgressSink for DotProgress<W> {
    fn tile_finished(&self, _tile: &Tile, ok: bool) {
        let marker: &[u8] = if ok { b"." } else { b"x" };
        if let Ok(mut out) = self.out.lock() {
            // Write errors are ignored.
            let _ = out.write_all(marker);
            let _ = out.flush();
        }
    }

    fn finish(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.write_all(b"\n");
            let _ = out.flush();
        }
    }
}

/// Counts finished tiles; useful for tests and summaries.
#[derive(Debug, Default)]
pub struct CountingProgress {
    ok: AtomicUsize,
    failed: AtomicUsize,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&self) -> usize {
        self.ok.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.ok() + self.failed()
    }
}

impl ProgressSink for CountingProgress {
    fn tile_finished(&self, _tile: &Tile, ok: bool) {
        if ok {
            self.ok.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Point;

    fn tile(index: u32) -> Tile {
        Tile {
            index,
            x: 0,
            y: 0,
            lo: Point::new(0.0, 0.0),
            hi: Point::new(1.0, 1.0),
        }
    }

    #[test]
    fn test_dot_progress_writes_one_marker_per_tile() {
        let progress = DotProgress::new(Vec::new());
        progress.tile_finished(&tile(1), true);
        progress.tile_finished(&tile(2), false);
        progress.tile_finished(&tile(3), true);
        progress.finish();

        assert_eq!(progress.into_inner(), b".x.\n");
    }

    #[test]
    fn test_counting_progress() {
        let progress = CountingProgress::new();
        progress.tile_finished(&tile(1), true);
        progress.tile_finished(&tile(2), true);
        progress.tile_finished(&tile(3), false);

        assert_eq!(progress.ok(), 2);
        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.total(), 3);
    }
}
