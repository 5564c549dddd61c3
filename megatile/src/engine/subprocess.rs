//! Subprocess-backed renderer invoking the external fractal engine.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use super::{RenderError, RenderFuture, TileRenderer, WorkerContext, WorkerSignals};
use crate::grid::Tile;

/// Command line for rendering one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInvocation {
    pub engine: PathBuf,
    pub args: Vec<OsString>,
}

impl RenderInvocation {
    /// Builds the engine command line for `tile`.
    ///
    /// Tiles are square, so width and height are both `tile_size`.
    pub fn for_tile(
        engine: &Path,
        output: &Path,
        tile: &Tile,
        iterations: u32,
        tile_size: u32,
    ) -> Self {
        let args = vec![
            output.as_os_str().to_os_string(),
            tile.lo.x.to_string().into(),
            tile.lo.y.to_string().into(),
            tile.hi.x.to_string().into(),
            tile.hi.y.to_string().into(),
            iterations.to_string().into(),
            tile_size.to_string().into(),
            tile_size.to_string().into(),
        ];
        Self {
            engine: engine.to_path_buf(),
            args,
        }
    }

    fn command(&self, signals: WorkerSignals) -> Command {
        let mut cmd = Command::new(&self.engine);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);

        #[cfg(unix)]
        if signals == WorkerSignals::Isolated {
            cmd.process_group(0);
        }
        #[cfg(not(unix))]
        let _ = signals;

        cmd
    }
}

/// Renders tiles by running the engine executable once per tile.
///
/// The child is spawned with kill-on-drop, so aborting the worker that
/// awaits it terminates the engine process as well.
#[derive(Debug, Clone)]
pub struct EngineRenderer {
    engine: PathBuf,
    output_dir: PathBuf,
    iterations: u32,
    tile_size: u32,
}

impl EngineRenderer {
    pub fn new(
        engine: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        iterations: u32,
        tile_size: u32,
    ) -> Self {
        Self {
            engine: engine.into(),
            output_dir: output_dir.into(),
            iterations,
            tile_size,
        }
    }

    /// The command line that would render `tile`.
    pub fn invocation(&self, tile: &Tile) -> RenderInvocation {
        RenderInvocation::for_tile(
            &self.engine,
            &tile.path(&self.output_dir),
            tile,
            self.iterations,
            self.tile_size,
        )
    }
}

impl TileRenderer for EngineRenderer {
    fn render<'a>(&'a self, tile: &'a Tile, ctx: &'a WorkerContext) -> RenderFuture<'a> {
        Box::pin(async move {
            let invocation = self.invocation(tile);
            trace!(
                worker = ctx.worker_id,
                tile = tile.index,
                args = ?invocation.args,
                "Spawning engine"
            );

            let mut child = invocation.command(ctx.signals).spawn().map_err(|source| {
                RenderError::Spawn {
                    engine: self.engine.clone(),
                    source,
                }
            })?;

            let status = child.wait().await.map_err(|source| RenderError::Wait {
                index: tile.index,
                source,
            })?;

            if !status.success() {
                return Err(RenderError::Exit {
                    index: tile.index,
                    status,
                });
            }

            debug!(worker = ctx.worker_id, tile = tile.index, "Tile rendered");
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "engine"
    }
}
