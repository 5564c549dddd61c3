//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::ValueEnum;
use megatile::config::ConfigFile;
use megatile::dispatch::FailurePolicy;

use crate::error::CliError;
use crate::progress::ProgressMode;

/// Tile failure handling for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FailureMode {
    /// Keep rendering, report failed tiles at the end
    Record,
    /// Stop the run at the first failed tile
    Abort,
}

impl From<FailureMode> for FailurePolicy {
    fn from(mode: FailureMode) -> Self {
        match mode {
            FailureMode::Record => FailurePolicy::Record,
            FailureMode::Abort => FailurePolicy::Abort,
        }
    }
}

/// Resolve the engine path: CLI, then config. There is no default.
pub fn resolve_engine(
    cli_engine: Option<PathBuf>,
    config: &ConfigFile,
) -> Result<PathBuf, CliError> {
    cli_engine
        .or_else(|| config.engine.path.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No fractal engine configured. \
                 Set path in the [engine] section of config.ini or use --engine"
                    .to_string(),
            )
        })
}

/// Resolve the tile size in pixels: CLI, then config.
pub fn resolve_tile_size(cli_tile: Option<u32>, config: &ConfigFile) -> Result<u32, CliError> {
    cli_tile.or(config.render.tile_size).ok_or_else(|| {
        CliError::Config(
            "No tile size given. \
             Use --tile or set tile_size in the [render] section of config.ini"
                .to_string(),
        )
    })
}

/// Resolve the iteration limit: CLI, then config.
pub fn resolve_iterations(
    cli_iterations: Option<u32>,
    config: &ConfigFile,
) -> Result<u32, CliError> {
    cli_iterations.or(config.engine.iterations).ok_or_else(|| {
        CliError::Config(
            "No iteration limit given. \
             Use --iterations or set iterations in the [engine] section of config.ini"
                .to_string(),
        )
    })
}

/// Resolve the worker count: CLI, then config. `None` means one per core.
pub fn resolve_jobs(cli_jobs: Option<usize>, config: &ConfigFile) -> Option<usize> {
    cli_jobs.or(config.render.jobs)
}

/// Resolve the progress display: CLI, then config, then dots.
pub fn resolve_progress(cli_progress: Option<ProgressMode>, config: &ConfigFile) -> ProgressMode {
    cli_progress
        .or_else(|| {
            config
                .render
                .progress
                .as_deref()
                .and_then(ProgressMode::from_config_str)
        })
        .unwrap_or(ProgressMode::Dots)
}

/// Resolve the failure policy: CLI, then config, then record.
pub fn resolve_failure_policy(
    cli_failure: Option<FailureMode>,
    config: &ConfigFile,
) -> FailurePolicy {
    cli_failure
        .map(FailurePolicy::from)
        .or(config.render.on_failure)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> ConfigFile {
        ConfigFile::parse(
            "[engine]\n\
             path = /opt/mandelbrot\n\
             iterations = 250\n\
             [render]\n\
             jobs = 3\n\
             tile_size = 128\n\
             progress = bar\n\
             on_failure = abort\n",
        )
        .unwrap()
    }

    #[test]
    fn test_cli_takes_precedence() {
        let config = configured();
        assert_eq!(
            resolve_engine(Some(PathBuf::from("./engine")), &config).unwrap(),
            PathBuf::from("./engine")
        );
        assert_eq!(resolve_tile_size(Some(512), &config).unwrap(), 512);
        assert_eq!(resolve_iterations(Some(10), &config).unwrap(), 10);
        assert_eq!(resolve_jobs(Some(1), &config), Some(1));
        assert_eq!(
            resolve_progress(Some(ProgressMode::None), &config),
            ProgressMode::None
        );
        assert_eq!(
            resolve_failure_policy(Some(FailureMode::Record), &config),
            FailurePolicy::Record
        );
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let config = configured();
        assert_eq!(
            resolve_engine(None, &config).unwrap(),
            PathBuf::from("/opt/mandelbrot")
        );
        assert_eq!(resolve_tile_size(None, &config).unwrap(), 128);
        assert_eq!(resolve_iterations(None, &config).unwrap(), 250);
        assert_eq!(resolve_jobs(None, &config), Some(3));
        assert_eq!(resolve_progress(None, &config), ProgressMode::Bar);
        assert_eq!(resolve_failure_policy(None, &config), FailurePolicy::Abort);
    }

    #[test]
    fn test_defaults_without_config() {
        let config = ConfigFile::default();
        assert!(matches!(
            resolve_engine(None, &config),
            Err(CliError::Config(_))
        ));
        assert!(resolve_tile_size(None, &config).is_err());
        assert!(resolve_iterations(None, &config).is_err());
        assert_eq!(resolve_jobs(None, &config), None);
        assert_eq!(resolve_progress(None, &config), ProgressMode::Dots);
        assert_eq!(resolve_failure_policy(None, &config), FailurePolicy::Record);
    }
}
