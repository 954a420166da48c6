//! Configuration file loader.

use std::path::PathBuf;

use super::TailConfig;

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: sincetail.toml
        search_paths.push(PathBuf::from("sincetail.toml"));

        // 2. User config directory: ~/.config/sincetail/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("sincetail").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load and validate configuration from the first available file.
    ///
    /// Unlike tools that can run on defaults, a tailer without a `path`
    /// list has nothing to do, so a missing config file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if no config file exists in the search paths,
    /// if the file cannot be read or parsed, or if validation rejects
    /// the parsed values.
    pub fn load(&self) -> Result<TailConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            return Err(ConfigError::NotFound {
                searched: self.search_paths.clone(),
            });
        };

        tracing::debug!(path = %path.display(), "Loading config file");
        let config = Self::load_from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &PathBuf) -> Result<TailConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config file found (searched {searched:?})")]
    NotFound { searched: Vec<PathBuf> },

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config must list at least one path to tail")]
    EmptyPathList,

    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    NonAsciiDelimiter(char),

    #[error("Unsupported encoding {0:?} (only UTF-8 is supported)")]
    UnsupportedEncoding(String),

    #[error("Worker pool size must be at least 1")]
    NoWorkers,
}
