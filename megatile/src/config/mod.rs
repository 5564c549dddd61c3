//! Configuration file handling for `~/.megatile/config.ini`.
//!
//! The file supplies defaults for values that rarely change between runs,
//! such as the engine path. Command-line flags always take precedence.
//!
//! ```ini
//! [engine]
//! path = /usr/local/bin/mandelbrot
//! iterations = 1000
//!
//! [render]
//! jobs = 8
//! tile_size = 256
//! progress = dots
//! on_failure = record
//!
//! [logging]
//! file = ~/.megatile/megatile.log
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::dispatch::FailurePolicy;

/// Progress display styles accepted in `[render] progress`.
pub const PROGRESS_STYLES: [&str; 3] = ["dots", "bar", "none"];

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub path: Option<PathBuf>,
    pub iterations: Option<u32>,
}

/// `[render]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSettings {
    pub jobs: Option<usize>,
    pub tile_size: Option<u32>,
    pub progress: Option<String>,
    pub on_failure: Option<FailurePolicy>,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingSettings {
    pub file: Option<PathBuf>,
}

/// Parsed configuration file. Every value is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub engine: EngineSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.megatile/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text)
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let engine_path = self.engine.path.as_ref().map(|p| p.display());
        set_opt(&mut ini, "engine", "path", engine_path);
        set_opt(&mut ini, "engine", "iterations", self.engine.iterations);
        set_opt(&mut ini, "render", "jobs", self.render.jobs);
        set_opt(&mut ini, "render", "tile_size", self.render.tile_size);
        set_opt(&mut ini, "render", "progress", self.render.progress.as_deref());
        let on_failure = self.render.on_failure.map(|p| p.as_str());
        set_opt(&mut ini, "render", "on_failure", on_failure);
        let log_file = self.logging.file.as_ref().map(|p| p.display());
        set_opt(&mut ini, "logging", "file", log_file);
        ini
    }
}

/// Writes `key = value`, or an empty `key =` placeholder when unset.
fn set_opt<V: ToString>(ini: &mut Ini, section: &str, key: &str, value: Option<V>) {
    let value = value.map(|v| v.to_string()).unwrap_or_default();
    ini.set_to(Some(section), key.to_string(), value);
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Returns the trimmed value of `key`, treating empty values as unset.
fn get<'a>(props: &'a ini::Properties, key: &str) -> Option<&'a str> {
    props.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = get(section, "path") {
            config.engine.path = Some(expand_tilde(v));
        }
        if let Some(v) = get(section, "iterations") {
            let n: u32 = v
                .parse()
                .map_err(|_| invalid("engine", "iterations", v, "expected a positive integer"))?;
            if n == 0 {
                return Err(invalid("engine", "iterations", v, "must be at least 1"));
            }
            config.engine.iterations = Some(n);
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = get(section, "jobs") {
            let n: usize = v
                .parse()
                .map_err(|_| invalid("render", "jobs", v, "expected a positive integer"))?;
            if n == 0 {
                return Err(invalid("render", "jobs", v, "must be at least 1"));
            }
            config.render.jobs = Some(n);
        }
        if let Some(v) = get(section, "tile_size") {
            let n: u32 = v
                .parse()
                .map_err(|_| invalid("render", "tile_size", v, "expected an integer"))?;
            if n <= 1 || !n.is_power_of_two() {
                return Err(invalid(
                    "render",
                    "tile_size",
                    v,
                    "must be a power of 2 greater than 1",
                ));
            }
            config.render.tile_size = Some(n);
        }
        if let Some(v) = get(section, "progress") {
            let v = v.to_lowercase();
            if !PROGRESS_STYLES.contains(&v.as_str()) {
                return Err(invalid(
                    "render",
                    "progress",
                    &v,
                    "must be one of: dots, bar, none",
                ));
            }
            config.render.progress = Some(v);
        }
        if let Some(v) = get(section, "on_failure") {
            config.render.on_failure = Some(match v.to_lowercase().as_str() {
                "record" => FailurePolicy::Record,
                "abort" => FailurePolicy::Abort,
                _ => {
                    return Err(invalid(
                        "render",
                        "on_failure",
                        v,
                        "must be one of: record, abort",
                    ))
                }
            });
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = get(section, "file") {
            config.logging.file = Some(expand_tilde(v));
        }
    }

    Ok(config)
}

/// Expands a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

/// Get the path to the config directory (~/.megatile).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".megatile")
}

/// Get the path to the config file (~/.megatile/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
