use crate::core::{DbreakError, Result};
use crate::render::OutputFormat;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub console: ConsoleConfig,
    pub logging: LoggingConfig,
    /// Extra named SQLite databases, name → path.
    pub connections: BTreeMap<String, String>,
}

/// Console-related configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub banner: bool,
    pub output: OutputFormat,
    pub prompt: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            banner: true,
            output: OutputFormat::Table,
            prompt: "dbreak".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "dbreak=warn".to_string(),
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = dbreak::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| DbreakError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&content).map_err(|e| DbreakError::Config(format!("{}: {e}", path.display())))
}

/// `<config dir>/dbreak/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dbreak").join("config.toml"))
}

/// Loads `path` when given, else the default file when it exists, else the
/// built-in defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => match default_config_path() {
            Some(path) if path.is_file() => load_config(path),
            _ => Ok(Config::default()),
        },
    }
}
