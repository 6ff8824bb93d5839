//! Engine configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use chess_engine::FixedHistory;

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// The configured search depth cannot be searched.
    #[error(
        "Invalid max_depth {0}: must be between 1 and {}",
        FixedHistory::PLY_CEILING - 1
    )]
    InvalidDepth(u8),
}

/// Search settings.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Iterative deepening stops after this many plies. Defaults to 6.
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,
    /// Transposition table size in megabytes; 0 disables the table.
    /// Defaults to 16.
    #[serde(default = "default_tt_size_mb")]
    pub tt_size_mb: usize,
}

fn default_max_depth() -> u8 {
    6
}

fn default_tt_size_mb() -> usize {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_depth: default_max_depth(),
            tt_size_mb: default_tt_size_mb(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// [`ConfigError::ParseError`] if it is not valid TOML, or
    /// [`ConfigError::InvalidDepth`] if the depth is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the depth leaves room for the search history.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth as usize >= FixedHistory::PLY_CEILING {
            return Err(ConfigError::InvalidDepth(self.max_depth));
        }
        Ok(())
    }
}
