//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// `--res` not in `WIDTHxHEIGHT` form
    #[error("invalid resolution '{value}' (expected WIDTHxHEIGHT, e.g. 1280x720)")]
    InvalidResolution { value: String },

    /// Player actor could not be placed
    #[error("failed to spawn the player after {attempts} attempts")]
    PlayerSpawn { attempts: usize },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_resolution(value: impl Into<String>) -> Self {
        Self::InvalidResolution {
            value: value.into(),
        }
    }
}
