//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use console::style;
use megatile::canvas::CanvasError;
use megatile::config::ConfigFileError;
use megatile::dispatch::DispatchError;
use megatile::engine::RenderError;
use megatile::manifest::ManifestError;

/// Exit code after an operator interrupt (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Failed to install the Ctrl+C handler
    SignalHandler(String),
    /// Canvas render failed or was interrupted
    Canvas(CanvasError),
    /// Manifest could not be written
    Manifest(ManifestError),
    /// Some tiles failed; the manifest was still written
    Incomplete { failed: usize, total: usize },
    /// Failed to write command output
    Output(String),
}

impl CliError {
    /// True when the operator interrupted the run.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CliError::Canvas(e) if e.is_cancelled())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_interrupted() {
            INTERRUPTED_EXIT_CODE
        } else {
            1
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        if self.is_interrupted() {
            eprintln!();
            eprintln!("{} {}", style("Interrupted!").for_stderr().yellow().bold(), self);
            process::exit(self.exit_code());
        }

        eprintln!("{} {}", style("Error:").for_stderr().red().bold(), self);

        // Print additional help for specific errors
        match self {
            CliError::Canvas(CanvasError::OutputExists(_)) => {
                eprintln!();
                eprintln!("Choose a new document name or remove the existing directory.");
            }
            CliError::Canvas(CanvasError::Dispatch(DispatchError::EngineFailure(failure)))
                if matches!(failure.error, RenderError::Spawn { .. }) =>
            {
                eprintln!();
                eprintln!("Check the engine path:");
                eprintln!("  1. Pass it with --engine <PATH>");
                eprintln!("  2. Or set [engine] path in the config file (megatile config path)");
            }
            CliError::Incomplete { .. } => {
                eprintln!();
                eprintln!("The manifest was written; failed tiles are missing from disk.");
                eprintln!("Re-run with --verbose for per-tile errors.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Canvas(e) => write!(f, "{}", e),
            CliError::Manifest(e) => write!(f, "{}", e),
            CliError::Incomplete { failed, total } => {
                write!(f, "{} of {} tiles failed to render", failed, total)
            }
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Canvas(e) => Some(e),
            CliError::Manifest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<CanvasError> for CliError {
    fn from(e: CanvasError) -> Self {
        CliError::Canvas(e)
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        CliError::Manifest(e)
    }
}
