//! Camera manager
//!
//! Owns the one imaging sensor attached to the player: which of the mount
//! points it sits on, which of the sensor variants is active, the latest
//! decoded surface and whether frames are handed to the recorder.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{
    ActorId, AttachmentType, ColorConverter, FrameCallback, Location, Rotation, SensorPacket,
    SensorPayload, SensorSource, SensorSpawner, SensorSpec, Transform,
};
use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use crate::decode::{decode_point_cloud, decode_raster, Surface};
use crate::error::Result;
use crate::handler::{weak_handler, SensorContext};
use crate::metrics::SensorMetrics;
use crate::notification::NotificationSender;

/// Half the vehicle width plus a margin, used by the side mount
const MOUNT_BOUND_Y: f64 = 1.4;

/// Lidar range attribute
const LIDAR_RANGE: &str = "50";

/// One selectable imaging sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraVariant {
    pub blueprint: &'static str,
    /// `None` for sensors that do not produce images
    pub converter: Option<ColorConverter>,
    pub label: &'static str,
}

pub const CAMERA_VARIANTS: [CameraVariant; 7] = [
    CameraVariant {
        blueprint: "sensor.camera.rgb",
        converter: Some(ColorConverter::Raw),
        label: "Camera RGB",
    },
    CameraVariant {
        blueprint: "sensor.camera.depth",
        converter: Some(ColorConverter::Raw),
        label: "Camera Depth (Raw)",
    },
    CameraVariant {
        blueprint: "sensor.camera.depth",
        converter: Some(ColorConverter::Depth),
        label: "Camera Depth (Gray Scale)",
    },
    CameraVariant {
        blueprint: "sensor.camera.depth",
        converter: Some(ColorConverter::LogarithmicDepth),
        label: "Camera Depth (Logarithmic Gray Scale)",
    },
    CameraVariant {
        blueprint: "sensor.camera.semantic_segmentation",
        converter: Some(ColorConverter::Raw),
        label: "Camera Semantic Segmentation (Raw)",
    },
    CameraVariant {
        blueprint: "sensor.camera.semantic_segmentation",
        converter: Some(ColorConverter::CityScapesPalette),
        label: "Camera Semantic Segmentation (CityScapes Palette)",
    },
    CameraVariant {
        blueprint: "sensor.lidar.ray_cast",
        converter: None,
        label: "Lidar (Ray-Cast)",
    },
];

/// Mount points relative to the parent, cycled by `toggle_camera`
pub fn camera_mounts() -> [(Transform, AttachmentType); 5] {
    [
        (
            Transform::new(Location::new(-5.5, 0.0, 2.5), Rotation::new(8.0, 0.0, 0.0)),
            AttachmentType::SpringArm,
        ),
        (
            Transform::new(Location::new(1.6, 0.0, 1.7), Rotation::default()),
            AttachmentType::Rigid,
        ),
        (
            Transform::new(Location::new(5.5, 1.5, 1.5), Rotation::default()),
            AttachmentType::SpringArm,
        ),
        (
            Transform::new(Location::new(-8.0, 0.0, 6.0), Rotation::new(6.0, 0.0, 0.0)),
            AttachmentType::SpringArm,
        ),
        (
            Transform::new(Location::new(-1.0, -MOUNT_BOUND_Y, 0.5), Rotation::default()),
            AttachmentType::Rigid,
        ),
    ]
}

/// State shared with the imaging handler
struct CameraState {
    width: u32,
    height: u32,
    /// Index into `CAMERA_VARIANTS` the handler decodes for
    active: AtomicUsize,
    surface: RwLock<Option<Arc<Surface>>>,
    recording: AtomicBool,
    recorder: Option<FrameCallback>,
    metrics: Arc<SensorMetrics>,
}

impl CameraState {
    fn on_packet(&self, packet: SensorPacket) {
        let variant = &CAMERA_VARIANTS[self.active.load(Ordering::Acquire) % CAMERA_VARIANTS.len()];
        let decoded = match &packet.payload {
            SensorPayload::PointCloud(cloud) => decode_point_cloud(cloud, self.width, self.height),
            SensorPayload::Image(image) => {
                decode_raster(image, variant.converter.unwrap_or_default())
            }
            _ => {
                trace!(sensor_id = %packet.sensor_id, "unexpected payload on imaging sensor");
                return;
            }
        };

        let surface = match decoded {
            Ok(surface) => Arc::new(surface),
            Err(e) => {
                self.metrics.record_decode_error();
                trace!(sensor_id = %packet.sensor_id, error = %e, "dropping undecodable frame");
                return;
            }
        };

        if self.recording.load(Ordering::Relaxed) {
            if let Some(recorder) = &self.recorder {
                recorder(surface.to_recorded_frame(packet.frame));
                self.metrics.record_frame_queued();
            }
        }
        *self.surface.write() = Some(surface);
    }
}

/// Imaging sensor wrapper
pub struct CameraManager {
    state: Arc<CameraState>,
    sensor: Option<Box<dyn SensorSource>>,
    parent: ActorId,
    index: Option<usize>,
    transform_index: usize,
    gamma: f64,
    notifications: NotificationSender,
}

impl CameraManager {
    /// Nothing is spawned until the first `set_sensor`
    pub fn new(
        parent: ActorId,
        display: (u32, u32),
        gamma: f64,
        ctx: &SensorContext,
        recorder: Option<FrameCallback>,
    ) -> Self {
        Self {
            state: Arc::new(CameraState {
                width: display.0,
                height: display.1,
                active: AtomicUsize::new(0),
                surface: RwLock::new(None),
                recording: AtomicBool::new(false),
                recorder,
                metrics: ctx.metrics.clone(),
            }),
            sensor: None,
            parent,
            index: None,
            transform_index: 1,
            gamma,
            notifications: ctx.notifications.clone(),
        }
    }

    /// Start from mount point `index` instead of the default one
    pub fn with_transform_index(mut self, index: usize) -> Self {
        self.transform_index = index % camera_mounts().len();
        self
    }

    /// Latest decoded frame
    pub fn surface(&self) -> Option<Arc<Surface>> {
        self.state.surface.read().clone()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn transform_index(&self) -> usize {
        self.transform_index
    }

    pub fn is_recording(&self) -> bool {
        self.state.recording.load(Ordering::Relaxed)
    }

    pub fn sensor_id(&self) -> Option<&str> {
        self.sensor.as_deref().map(|s| s.sensor_id())
    }

    /// Move the sensor to the next mount point
    pub fn toggle_camera<S>(&mut self, spawner: &S) -> Result<()>
    where
        S: SensorSpawner + ?Sized,
    {
        self.transform_index = (self.transform_index + 1) % camera_mounts().len();
        self.set_sensor(spawner, self.index.unwrap_or(0), false, true)
    }

    pub fn next_sensor<S>(&mut self, spawner: &S) -> Result<()>
    where
        S: SensorSpawner + ?Sized,
    {
        let next = self.index.map_or(0, |i| i + 1);
        self.set_sensor(spawner, next, true, false)
    }

    /// Activate a sensor variant
    ///
    /// The sensor actor is respawned only when the blueprint changes, when
    /// nothing is spawned yet, or when `force_respawn` is set. Switching
    /// between variants of the same blueprint only changes the decoding.
    #[instrument(name = "camera_set_sensor", skip(self, spawner), fields(parent = self.parent))]
    pub fn set_sensor<S>(
        &mut self,
        spawner: &S,
        index: usize,
        notify: bool,
        force_respawn: bool,
    ) -> Result<()>
    where
        S: SensorSpawner + ?Sized,
    {
        let index = index % CAMERA_VARIANTS.len();
        let variant = CAMERA_VARIANTS[index];
        let needs_respawn = match self.index {
            None => true,
            Some(current) => {
                force_respawn
                    || self.sensor.is_none()
                    || CAMERA_VARIANTS[current].blueprint != variant.blueprint
            }
        };

        if needs_respawn {
            self.release();
            self.state.active.store(index, Ordering::Release);

            let (transform, attachment) = camera_mounts()[self.transform_index];
            let spec = self.sensor_spec(&variant).with_transform(transform, attachment);
            let source = spawner.spawn_sensor(&spec, self.parent)?;
            source.listen(weak_handler(
                &self.state,
                source.sensor_type(),
                self.state.metrics.clone(),
                CameraState::on_packet,
            ));
            debug!(sensor_id = %source.sensor_id(), label = variant.label, "imaging sensor spawned");
            self.sensor = Some(source);
        } else {
            self.state.active.store(index, Ordering::Release);
        }

        if notify {
            self.notifications.notify(variant.label);
        }
        self.index = Some(index);
        Ok(())
    }

    fn sensor_spec(&self, variant: &CameraVariant) -> SensorSpec {
        let spec = SensorSpec::new(variant.blueprint);
        if variant.blueprint.starts_with("sensor.camera") {
            let spec = spec
                .with_attribute("image_size_x", self.state.width.to_string())
                .with_attribute("image_size_y", self.state.height.to_string());
            if variant.blueprint == "sensor.camera.rgb" {
                spec.with_attribute("gamma", self.gamma.to_string())
            } else {
                spec
            }
        } else {
            spec.with_attribute("range", LIDAR_RANGE)
        }
    }

    pub fn toggle_recording(&mut self) -> bool {
        let recording = !self.state.recording.load(Ordering::Relaxed);
        self.state.recording.store(recording, Ordering::Relaxed);
        self.notifications.notify(format!(
            "Recording {}",
            if recording { "On" } else { "Off" }
        ));
        recording
    }

    /// Destroy the sensor and forget the surface
    fn release(&mut self) {
        if let Some(sensor) = self.sensor.take() {
            sensor.destroy();
            debug!(sensor_id = %sensor.sensor_id(), "imaging sensor destroyed");
        }
        *self.state.surface.write() = None;
    }

    /// Release the sensor; no frame reaches the surface afterwards
    pub fn destroy(&mut self) {
        self.release();
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}
