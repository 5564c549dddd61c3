//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show`, and `config path` for creating and
//! inspecting `~/.megatile/config.ini`.

use std::io::{self, Write};

use clap::Subcommand;
use megatile::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create the configuration file with every key present but unset
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration settings
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(force),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Path => run_path(),
    }
}

/// Create the configuration file.
fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() && !force {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Show all configuration settings.
fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let stdout = io::stdout();
    write_settings(&mut stdout.lock(), &config).map_err(|e| CliError::Output(e.to_string()))
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Every setting as `(section, key, value)`, with unset values empty.
fn settings(config: &ConfigFile) -> Vec<(&'static str, &'static str, String)> {
    let path = |p: &Option<std::path::PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    };
    let num = |n: Option<u64>| n.map(|n| n.to_string()).unwrap_or_default();
    let failure = config
        .render
        .on_failure
        .map(|p| p.to_string())
        .unwrap_or_default();

    vec![
        ("engine", "path", path(&config.engine.path)),
        ("engine", "iterations", num(config.engine.iterations.map(u64::from))),
        ("render", "jobs", num(config.render.jobs.map(|j| j as u64))),
        ("render", "tile_size", num(config.render.tile_size.map(u64::from))),
        ("render", "progress", config.render.progress.clone().unwrap_or_default()),
        ("render", "on_failure", failure),
        ("logging", "file", path(&config.logging.file)),
    ]
}

fn write_settings<W: Write>(out: &mut W, config: &ConfigFile) -> io::Result<()> {
    writeln!(out, "Configuration Settings")?;
    writeln!(out, "======================")?;

    let mut current_section = "";
    for (section, key, value) in settings(config) {
        // Print section header when section changes
        if section != current_section {
            writeln!(out)?;
            writeln!(out, "[{}]", section)?;
            current_section = section;
        }

        if value.is_empty() {
            writeln!(out, "  {} = (not set)", key)?;
        } else {
            writeln!(out, "  {} = {}", key, value)?;
        }
    }
    Ok(())
}
