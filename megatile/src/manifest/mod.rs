//! Manifest (`mega.yaml`) writer.
//!
//! The manifest tells a mega-canvas viewer how the flat directory of
//! `<index>.rgba` tiles is organised:
//!
//! ```yaml
//! mega: 1
//! tile-count: 16
//! tile-size: 8
//! layers:
//!   - parallax: [1,1]
//!     origin: [0,0]
//!     size: 2
//!     tiles:
//!       - 1
//!       - 2
//!       - 5
//!       ...
//! ```
//!
//! `tile-size` is `log2` of the tile's pixel size and `size` is the quadtree
//! depth, `log2` of the grid side.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::grid::Grid;
use crate::quadtree;

/// Manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "mega.yaml";

const TEMP_SUFFIX: &str = ".partial";

/// Errors that can occur while writing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Writing the manifest failed.
    #[error("Failed to write manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes the manifest for `grid` to `out`.
///
/// Output depends only on the grid, so writing twice yields identical bytes.
pub fn write<W: Write>(out: &mut W, grid: &Grid) -> io::Result<()> {
    writeln!(out, "mega: {}", MANIFEST_VERSION)?;
    writeln!(out, "tile-count: {}", grid.tile_count())?;
    writeln!(out, "tile-size: {}", grid.tile_log_size())?;
    writeln!(out, "layers:")?;
    writeln!(out, "  - parallax: [1,1]")?;
    writeln!(out, "    origin: [0,0]")?;
    writeln!(out, "    size: {}", grid.depth())?;
    writeln!(out, "    tiles:")?;
    quadtree::write_leaves(out, grid.size())
}

/// Writes `<dir>/mega.yaml`.
///
/// The manifest is written to a temporary sibling and renamed into place,
/// so an interrupted write never leaves a truncated `mega.yaml` behind.
pub fn write_to_dir(dir: &Path, grid: &Grid) -> Result<PathBuf, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    let temp = dir.join(format!("{}{}", MANIFEST_FILE, TEMP_SUFFIX));
    let io_err = |source: io::Error| ManifestError::Io {
        path: path.clone(),
        source,
    };

    let file = File::create(&temp).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    write(&mut out, grid).map_err(io_err)?;
    out.into_inner()
        .map_err(|e| io_err(e.into_error()))?
        .sync_all()
        .map_err(io_err)?;
    fs::rename(&temp, &path).map_err(io_err)?;

    debug!(
        path = %path.display(),
        tiles = grid.tile_count(),
        depth = grid.depth(),
        "Wrote manifest"
    );
    Ok(path)
}
