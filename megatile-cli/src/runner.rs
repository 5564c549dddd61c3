//! CLI runner for common setup and operations.
//!
//! Loads the config file and initializes logging so command handlers start
//! from the same place.

use megatile::config::ConfigFile;
use megatile::logging::{init_logging, LoggingGuard, DEFAULT_LEVEL};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Number of `-v` flags; raises the default log level
    ///   when `RUST_LOG` is not set
    pub fn new(verbose: u8) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(level_for(verbose), config.logging.file.as_deref())
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(version = megatile::VERSION, command, "megatile starting");
    }
}

/// Default log level for a `-v` count.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => DEFAULT_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(5), "trace");
    }
}
