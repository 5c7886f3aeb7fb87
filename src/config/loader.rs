//! Configuration File Loading
//!
//! Locates session configuration files, parses them as TOML or JSON and
//! validates the result. Missing files fall back to defaults.

use super::SessionConfig;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "RLI_CONFIG";

/// Directory name used under the platform config directory
const APP_DIR: &str = "rli";

/// Configuration file loader
pub struct ConfigLoader {
    /// Base paths (without extension) searched for configuration files
    search_paths: Vec<PathBuf>,
    /// Formats tried for every base path, in order
    supported_formats: Vec<ConfigFormat>,
    /// Path of the file that was actually loaded
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Guess the format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

impl ConfigLoader {
    /// Create a loader with the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load from `RLI_CONFIG` if set, otherwise search the default locations
    pub fn load() -> Result<SessionConfig> {
        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            return Self::load_from_file(Path::new(&explicit));
        }

        let mut loader = Self::new();
        loader.load_first_found()
    }

    /// Load and validate a specific file
    pub fn load_from_file(path: &Path) -> Result<SessionConfig> {
        let loader = Self::new();
        let config = loader.load_config_file(path, ConfigFormat::from_path(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Search the configured paths; defaults when nothing is found
    pub fn load_first_found(&mut self) -> Result<SessionConfig> {
        match self.find_and_load_config()? {
            Some((path, config)) => {
                config.validate()?;
                debug!("Loaded session config from {}", path.display());
                self.current_path = Some(path);
                Ok(config)
            }
            None => {
                debug!("No session config found, using defaults");
                Ok(SessionConfig::default())
            }
        }
    }

    /// Save configuration, format chosen by extension
    pub fn save_to_path(&self, config: &SessionConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: format.label().to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: format.label().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content)?;
        Ok(())
    }

    fn find_and_load_config(&self) -> Result<Option<(PathBuf, SessionConfig)>> {
        for base in &self.search_paths {
            for format in &self.supported_formats {
                let config_path = base.with_extension(format.extension());
                if !config_path.exists() {
                    continue;
                }

                match self.load_config_file(&config_path, *format) {
                    Ok(config) => return Ok(Some((config_path, config))),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", config_path.display(), e);
                    }
                }
            }
        }

        Ok(None)
    }

    fn load_config_file(&self, path: &Path, format: ConfigFormat) -> Result<SessionConfig> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                format: format.label().to_string(),
                reason: e.to_string(),
            }),
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                    format: format.label().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join(APP_DIR).join("config"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let candidate = config_dir.join(APP_DIR).join("config");
            if !paths.contains(&candidate) {
                paths.push(candidate);
            }
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", APP_DIR)).join("config"));
        }

        paths
    }

    /// Default location for the persisted history file
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR).join("history"))
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Replace the search paths with a single base path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
