//! Contains the [BridgeConfig] struct.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use xdg::BaseDirectories;

const CONFIG_PREFIX: &str = "waybridge";
const CONFIG_FILE: &str = "wayland.toml";
const APP_ID_ENV: &str = "WAYBRIDGE_APP_ID";

/// Errors that can occur while loading the bridge configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, std::io::Error),

    /// Failed to parse a TOML configuration file.
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    /// XDG base directories could not be resolved.
    #[error("Failed to resolve XDG directories: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Toplevel title.
    pub title: String,
    /// Toplevel application id.
    pub app_id: String,
    /// Width used until the compositor suggests one.
    pub width: u32,
    /// Height used until the compositor suggests one.
    pub height: u32,
    /// Request server-side decorations when the compositor supports them.
    pub server_side_decorations: bool,
    /// Synthesize repeated key events from the compositor's repeat info.
    pub key_repeat: bool,
    /// How long window creation waits for the first configure.
    pub initial_configure_timeout_ms: u64,
    /// Optional `env_logger` filter applied by the facade's logging helper.
    pub log_filter: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            title: "New App".to_string(),
            app_id: "org.waybridge.app".to_string(),
            width: 800,
            height: 600,
            server_side_decorations: true,
            key_repeat: true,
            initial_configure_timeout_ms: 2000,
            log_filter: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from the standard locations.
    ///
    /// The highest priority file found wins:
    /// 1. User config: `$XDG_CONFIG_HOME/waybridge/wayland.toml`
    /// 2. System config: `$XDG_CONFIG_DIRS/waybridge/wayland.toml`
    ///
    /// `WAYBRIDGE_APP_ID` then overrides the app id.
    pub fn load() -> Result<Self, ConfigError> {
        let xdg_dirs = BaseDirectories::with_prefix(CONFIG_PREFIX)?;
        let mut config = match xdg_dirs.find_config_file(CONFIG_FILE) {
            Some(path) => Self::from_file(&path)?,
            None => {
                log::debug!("No {} found, using defaults", CONFIG_FILE);
                Self::default()
            },
        };
        if let Ok(app_id) = std::env::var(APP_ID_ENV) {
            if !app_id.is_empty() {
                config.app_id = app_id;
            }
        }
        Ok(config)
    }

    /// Load configuration from a single TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        log::debug!("Loading bridge config from {:?}", path);
        Self::parse(&content, path)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<string>"))
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(origin.to_path_buf(), e.to_string()))
    }

    /// Size used before the first non-zero configure.
    pub fn initial_size(&self) -> (u32, u32) {
        (self.width.max(1), self.height.max(1))
    }
}
