//! Configuration management for reclink.
//!
//! Handles loading and saving the TOML configuration file from the platform
//! config directory (or an explicit path), with atomic write operations.

use crate::{
    AppError, AppResult,
    config::{CONFIG_FILE_NAME, CONFIG_FLAG},
};

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use reclink_core::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recorder client settings handed to the core.
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from `path_override`, or from the platform config
    /// directory when none is given. Creates a default file if not found.
    #[track_caller]
    #[instrument]
    pub fn load(path_override: Option<PathBuf>) -> AppResult<Self> {
        let config_path = match path_override {
            Some(path) => path,
            None => Self::config_path()?,
        };

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, creating it with defaults
    /// if it does not exist.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            info!(config_path = ?config_path, "No config found, creating default");
            return Self::create_default(config_path);
        }

        let contents = fs::read_to_string(config_path)
            .map_err(|e| AppError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::config(format!("Failed to parse config: {}", e)))?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| AppError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(config_dir = ?parent, "Created config directory");
        }

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path)
            .map_err(|e| AppError::config(format!("Failed to create temp config file: {}", e)))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::config(format!("Failed to write temp config file: {}", e)))?;

        temp_file
            .sync_all()
            .map_err(|e| AppError::config(format!("Failed to sync temp config file: {}", e)))?;

        fs::rename(&temp_path, config_path).map_err(|e| {
            AppError::config(format!("Failed to rename temp config to final: {}", e))
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Extract a config path override from the process arguments.
    ///
    /// Accepts either `--config <path>` or a bare path as the first argument.
    #[track_caller]
    pub fn path_from_args<I>(args: I) -> AppResult<Option<PathBuf>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        match args.next() {
            None => Ok(None),
            Some(flag) if flag == CONFIG_FLAG => args
                .next()
                .map(|path| Some(PathBuf::from(path)))
                .ok_or_else(|| AppError::config(format!("{CONFIG_FLAG} requires a path"))),
            Some(path) => Ok(Some(PathBuf::from(path))),
        }
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "reclink", "Reclink")
            .ok_or_else(|| AppError::config("Failed to get config directory"))?;

        Ok(proj_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    #[track_caller]
    fn create_default(config_path: &Path) -> AppResult<Self> {
        let config = Config::default();
        config.save_to(config_path)?;

        info!(
            server_url = %config.client.server_url,
            "Default config created"
        );

        Ok(config)
    }
}
