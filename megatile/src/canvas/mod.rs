//! End-to-end canvas rendering.
//!
//! Ties the pieces together in the order a run needs them:
//!
//! 1. validate the configuration ([`CanvasConfig`]);
//! 2. create the output directory (it must not exist yet);
//! 3. partition the domain into tiles;
//! 4. dispatch one render task per tile;
//! 5. write `mega.yaml`, only if the dispatch was not interrupted.

mod config;

pub use config::{CanvasConfig, CanvasConfigBuilder};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dispatch::{DispatchError, DispatchReport, JobDispatcher, ProgressSink};
use crate::engine::{EngineRenderer, TileRenderer};
use crate::grid::{ConfigError, Partition};
use crate::manifest::{self, ManifestError};

/// Errors from a canvas render.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Iteration count must be at least 1")]
    InvalidIterations,

    /// The output directory already exists.
    #[error("Output directory already exists: {0}")]
    OutputExists(PathBuf),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to create Tokio runtime: {0}")]
    RuntimeCreation(#[source] io::Error),
}

impl CanvasError {
    /// True when the run stopped because the operator interrupted it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CanvasError::Dispatch(e) if e.is_cancelled())
    }
}

/// Result of a completed canvas render.
#[derive(Debug)]
pub struct CanvasRun {
    pub report: DispatchReport,
    pub manifest: PathBuf,
}

/// Renders a canvas with `renderer`.
///
/// On cancellation the tiles already written stay on disk but no manifest
/// is produced.
pub async fn render_canvas<R>(
    config: &CanvasConfig,
    renderer: Arc<R>,
    progress: Arc<dyn ProgressSink>,
    cancel: &CancellationToken,
) -> Result<CanvasRun, CanvasError>
where
    R: TileRenderer + ?Sized,
{
    let dir = config.output_dir();
    if dir.exists() {
        return Err(CanvasError::OutputExists(dir.to_path_buf()));
    }
    std::fs::create_dir(dir).map_err(|source| CanvasError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let partition = Partition::new(config.bounds(), config.grid());
    let tiles = partition.tiles();

    info!(
        output = %dir.display(),
        size = config.grid().size(),
        tile_size = config.grid().tile_size(),
        tiles = tiles.len(),
        "Rendering canvas"
    );

    let report = JobDispatcher::new(*config.dispatch(), renderer)
        .with_progress(progress)
        .run(&tiles, cancel)
        .await?;

    // An interrupt that lands after the last tile still withholds the manifest.
    if cancel.is_cancelled() {
        warn!("Interrupted before the manifest was written");
        return Err(DispatchError::Cancelled {
            completed: report.rendered + report.failures.len(),
            total: report.total,
        }
        .into());
    }

    let manifest = manifest::write_to_dir(dir, &config.grid())?;
    info!(manifest = %manifest.display(), "Canvas complete");

    Ok(CanvasRun { report, manifest })
}

/// Renders a canvas with the external engine on a fresh multi-threaded
/// runtime, blocking the calling thread until the run ends.
pub fn render_canvas_blocking(
    config: &CanvasConfig,
    progress: Arc<dyn ProgressSink>,
    cancel: &CancellationToken,
) -> Result<CanvasRun, CanvasError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("megatile-worker")
        .build()
        .map_err(CanvasError::RuntimeCreation)?;

    let renderer = Arc::new(EngineRenderer::new(
        config.engine(),
        config.output_dir(),
        config.iterations(),
        config.grid().tile_size(),
    ));

    runtime.block_on(render_canvas(config, renderer, progress, cancel))
}
