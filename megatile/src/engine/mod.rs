//! Tile rendering seam.
//!
//! The dispatcher does not know how a tile becomes an image. It hands each
//! [`Tile`] to a [`TileRenderer`], which for real runs is an
//! [`EngineRenderer`] invoking the external fractal engine as a subprocess:
//!
//! ```text
//! <engine> <path> <loX> <loY> <hiX> <hiY> <iterations> <width> <height>
//! ```

mod subprocess;

pub use subprocess::{EngineRenderer, RenderInvocation};

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::ExitStatus;

use thiserror::Error;

use crate::grid::Tile;

/// Future returned by [`TileRenderer::render`].
pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RenderError>> + Send + 'a>>;

/// How engine subprocesses treat the terminal's interrupt signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerSignals {
    /// Run engines in their own process group so a terminal Ctrl+C only
    /// reaches the coordinator, which then kills them explicitly.
    #[default]
    Isolated,
    /// Engines share the coordinator's process group and signal disposition.
    Inherit,
}

/// Per-worker context handed to the renderer with every tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    /// Zero-based worker number within the pool.
    pub worker_id: usize,
    /// Signal disposition for anything the worker spawns.
    pub signals: WorkerSignals,
}

/// Errors produced while rendering a single tile.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine executable could not be started.
    #[error("Failed to start engine {engine}: {source}")]
    Spawn {
        engine: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the engine process failed.
    #[error("Failed to wait for engine rendering tile {index}: {source}")]
    Wait {
        index: u32,
        #[source]
        source: std::io::Error,
    },

    /// The engine exited unsuccessfully.
    #[error("Engine failed rendering tile {index}: {status}")]
    Exit { index: u32, status: ExitStatus },

    /// Any other renderer-specific failure.
    #[error("Rendering tile {index} failed: {reason}")]
    Other { index: u32, reason: String },
}

/// Strategy for producing the image file of one tile.
///
/// Implementations must be thread-safe: the pool calls `render` from
/// several workers at once, each with a different tile.
pub trait TileRenderer: Send + Sync + 'static {
    /// Renders `tile`, writing its output file as a side effect.
    fn render<'a>(&'a self, tile: &'a Tile, ctx: &'a WorkerContext) -> RenderFuture<'a>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
