//! Terminal progress displays.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use megatile::dispatch::{DotProgress, NoProgress, ProgressSink};
use megatile::grid::Tile;

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tiles {msg}";

/// Progress display selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ProgressMode {
    /// One character per finished tile (`.` rendered, `x` failed)
    Dots,
    /// A progress bar with counts and elapsed time
    Bar,
    /// No progress output
    None,
}

impl ProgressMode {
    /// Parse from config file string.
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dots" => Some(ProgressMode::Dots),
            "bar" => Some(ProgressMode::Bar),
            "none" => Some(ProgressMode::None),
            _ => None,
        }
    }

    /// Builds the sink for a run of `total` tiles.
    pub fn sink(self, total: u64) -> Arc<dyn ProgressSink> {
        match self {
            ProgressMode::Dots => Arc::new(DotProgress::stdout()),
            ProgressMode::Bar => Arc::new(BarProgress::new(total)),
            ProgressMode::None => Arc::new(NoProgress),
        }
    }
}

/// Progress bar that also counts failed tiles in its message.
pub struct BarProgress {
    bar: ProgressBar,
    failed: AtomicUsize,
}

impl BarProgress {
    pub fn new(total: u64) -> Self {
        Self::with_bar(ProgressBar::new(total))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        Self {
            bar,
            failed: AtomicUsize::new(0),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl ProgressSink for BarProgress {
    fn tile_finished(&self, _tile: &Tile, ok: bool) {
        if !ok {
            let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
            self.bar.set_message(format!("({} failed)", failed));
        }
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.abandon();
    }
}
