//! # Sensors
//!
//! Observation caches fed by simulator callbacks.
//!
//! Responsibilities:
//! - Attach one sensor per wrapper and register exactly one non-owning handler
//! - Keep the latest value(s) per sensor kind for the HUD to read each frame
//! - Decode camera images and lidar sweeps into display-ready surfaces
//! - Post transient notifications without touching the HUD
//!
//! Handlers run on the simulator's delivery thread; they only do cheap
//! transforms and never block. Dropping a wrapper destroys its sensor
//! synchronously.

mod macros;

pub mod camera;
pub mod collision;
pub mod decode;
pub mod error;
pub mod gnss;
pub mod handler;
pub mod lane_invasion;
pub mod metrics;
pub mod notification;

#[cfg(test)]
mod test_support;

pub use camera::{camera_mounts, CameraManager, CameraVariant, CAMERA_VARIANTS};
pub use collision::{CollisionSensor, COLLISION_HISTORY_CAPACITY};
pub use decode::{decode_point_cloud, decode_raster, LidarPoint, Surface};
pub use error::{Result, SensorError};
pub use gnss::GnssSensor;
pub use handler::{weak_handler, SensorContext};
pub use lane_invasion::{crossed_line_text, LaneInvasionSensor};
pub use metrics::{SensorMetrics, SensorMetricsSnapshot};
pub use notification::{
    notification_channel, Notification, NotificationLevel, NotificationReceiver,
    NotificationSender, DEFAULT_NOTIFICATION_SECONDS,
};
