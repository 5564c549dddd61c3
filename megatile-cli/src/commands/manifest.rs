//! Manifest command - (re)write `mega.yaml` for an existing tile directory.

use std::path::{Path, PathBuf};

use megatile::grid::Grid;
use megatile::manifest;

use super::common::resolve_tile_size;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the manifest command.
pub fn run(dir: &Path, tile: Option<u32>, size: u32, verbose: u8) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("manifest");

    let tile_size = resolve_tile_size(tile, runner.config())?;
    let path = write(dir, tile_size, size)?;

    println!("{}", path.display());
    Ok(())
}

fn write(dir: &Path, tile_size: u32, size: u32) -> Result<PathBuf, CliError> {
    if !dir.is_dir() {
        return Err(CliError::Config(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }
    let grid = Grid::new(size, tile_size).map_err(|e| CliError::Config(e.to_string()))?;
    Ok(manifest::write_to_dir(dir, &grid)?)
}
