//! Layered error definitions
//!
//! Categorized by source: config / simulator / sensor / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Simulator Errors =====
    /// Simulator connection error
    #[error("simulator connection error: {message}")]
    SimulatorConnection { message: String },

    /// The server could not provide map data
    #[error("map unavailable: {message}")]
    MapUnavailable { message: String },

    /// The map has no spawn points for the player
    #[error("there are no spawn points available in map '{map}'")]
    NoSpawnPoints { map: String },

    /// Actor spawn error
    #[error("spawn error for '{blueprint}': {message}")]
    Spawn { blueprint: String, message: String },

    /// Actor not found
    #[error("actor not found: {actor_id}")]
    ActorNotFound { actor_id: u32 },

    // ===== Sensor Errors =====
    /// Data parse error
    #[error("payload parse error for sensor '{sensor_id}': {message}")]
    PayloadParse { sensor_id: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create spawn error
    pub fn spawn(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn payload_parse(sensor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadParse {
            sensor_id: sensor_id.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error must terminate the whole run at startup
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            Self::MapUnavailable { .. }
                | Self::NoSpawnPoints { .. }
                | Self::SimulatorConnection { .. }
                | Self::Spawn { .. }
        )
    }
}
