//! Configuration types and loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default port for the board server.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TASKBOARD_CONFIG_PATH";

/// Config file looked up in the working directory when nothing else is given.
const LOCAL_CONFIG_FILE: &str = "taskboard.yaml";

/// UI mode for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    /// RPC procedures only, no HTML routes
    None,
    /// Serve the htmx board UI alongside the RPC surface (default)
    #[default]
    Web,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind (default: 127.0.0.1).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub ui: UiMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind: default_bind(),
            port: default_port(),
            ui: UiMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist; otherwise the path named by
    /// `TASKBOARD_CONFIG_PATH` is tried, then `taskboard.yaml` in the
    /// working directory, then built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(Path::new(&env_path));
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Create the database file's parent directory if needed.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("creating database directory {}", parent.display())
                })?;
            }
        }
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("taskboard").join("taskboard.db"))
        .unwrap_or_else(|| PathBuf::from("taskboard.db"))
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.ui, UiMode::Web);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "127.0.0.1");
    }

    #[test]
    fn ui_mode_parses_snake_case() {
        let config: Config = serde_yaml::from_str("server:\n  ui: none\n").unwrap();
        assert_eq!(config.server.ui, UiMode::None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/taskboard.yaml"))).is_err());
    }
}
