//! SensorSource trait - Sensor data source abstraction
//!
//! Defines a unified interface for the Event Source side of every sensor,
//! decoupling sensor wrappers from the concrete simulator implementation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{ActorId, ContractError, SensorPacket, SensorType, Transform};

/// Sensor data callback type
///
/// Invoked on the simulator's delivery thread, once per event.
/// Uses `Arc` to allow callback sharing across multiple contexts.
pub type SensorDataCallback = Arc<dyn Fn(SensorPacket) + Send + Sync>;

/// Sensor data source trait
///
/// Implemented by every simulator backend. Sensor wrappers register exactly
/// one callback through `listen` and release the source with `destroy`.
///
/// # Example
///
/// ```ignore
/// let sensor: Box<dyn SensorSource> = spawner.spawn_sensor(&spec, player_id)?;
/// sensor.listen(Arc::new(|packet| {
///     tracing::trace!(frame = packet.frame, "packet");
/// }));
/// // ... use sensor ...
/// sensor.destroy();
/// ```
pub trait SensorSource: Send + Sync {
    /// Get sensor ID
    fn sensor_id(&self) -> &str;

    /// Get sensor type
    fn sensor_type(&self) -> SensorType;

    /// Register data callback
    ///
    /// If already listening, repeated calls are idempotent (the first
    /// callback stays registered).
    fn listen(&self, callback: SensorDataCallback);

    /// Stop listening
    ///
    /// Synchronous: once this returns, the callback is never invoked again.
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;

    /// Stop and remove the sensor actor from the world
    fn destroy(&self) {
        self.stop();
    }
}

/// How a sensor is attached to its parent actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachmentType {
    #[default]
    Rigid,
    SpringArm,
}

/// Everything needed to spawn one sensor on a parent actor
#[derive(Debug, Clone)]
pub struct SensorSpec {
    /// Blueprint id (e.g., "sensor.camera.rgb")
    pub blueprint: String,
    pub transform: Transform,
    pub attachment: AttachmentType,
    /// Blueprint attributes (image_size_x, range, ...)
    pub attributes: HashMap<String, String>,
}

impl SensorSpec {
    pub fn new(blueprint: impl Into<String>) -> Self {
        Self {
            blueprint: blueprint.into(),
            transform: Transform::default(),
            attachment: AttachmentType::Rigid,
            attributes: HashMap::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform, attachment: AttachmentType) -> Self {
        self.transform = transform;
        self.attachment = attachment;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sensor kind implied by the blueprint id
    pub fn sensor_type(&self) -> Option<SensorType> {
        match self.blueprint.as_str() {
            "sensor.other.collision" => Some(SensorType::Collision),
            "sensor.other.lane_invasion" => Some(SensorType::LaneInvasion),
            "sensor.other.gnss" => Some(SensorType::Gnss),
            b if b.starts_with("sensor.camera.") => Some(SensorType::Camera),
            b if b.starts_with("sensor.lidar.") => Some(SensorType::Lidar),
            _ => None,
        }
    }
}

/// Spawns sensor sources attached to a parent actor
pub trait SensorSpawner: Send + Sync {
    fn spawn_sensor(
        &self,
        spec: &SensorSpec,
        parent: ActorId,
    ) -> Result<Box<dyn SensorSource>, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_type_from_blueprint() {
        assert_eq!(
            SensorSpec::new("sensor.camera.depth").sensor_type(),
            Some(SensorType::Camera)
        );
        assert_eq!(
            SensorSpec::new("sensor.lidar.ray_cast").sensor_type(),
            Some(SensorType::Lidar)
        );
        assert_eq!(
            SensorSpec::new("sensor.other.gnss").sensor_type(),
            Some(SensorType::Gnss)
        );
        assert_eq!(SensorSpec::new("sensor.other.radar").sensor_type(), None);
    }
}
