//! Simulator error types

use contracts::ContractError;
use thiserror::Error;

/// Simulator boundary specific error
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// Connection error
    #[error("failed to connect to simulator at {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Operation issued before `connect`
    #[error("not connected to simulator")]
    NotConnected,

    /// Actor spawn error
    #[error("failed to spawn '{blueprint}': {message}")]
    SpawnFailed { blueprint: String, message: String },

    /// Unknown actor
    #[error("actor {actor_id} not found")]
    ActorNotFound { actor_id: u32 },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl SimulatorError {
    /// Create spawn error
    pub fn spawn_failed(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }
}

impl From<SimulatorError> for ContractError {
    fn from(err: SimulatorError) -> Self {
        match err {
            SimulatorError::ConnectionFailed { .. } | SimulatorError::NotConnected => {
                ContractError::SimulatorConnection {
                    message: err.to_string(),
                }
            }
            SimulatorError::SpawnFailed { blueprint, message } => {
                ContractError::spawn(blueprint, message)
            }
            SimulatorError::ActorNotFound { actor_id } => ContractError::ActorNotFound { actor_id },
            SimulatorError::Contract(inner) => inner,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SimulatorError>;
