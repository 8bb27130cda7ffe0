//! Mock sensor implementation
//!
//! Implements `SensorSource` on top of a shared registry owned by the mock
//! simulator. Delivery happens on the simulator's tick thread while the
//! registry lock is held, so `stop` and `destroy` are synchronous: once they
//! return, the callback is never invoked again.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Arc;

use bytes::Bytes;
use contracts::{
    ActorId, CollisionEvent, GnssData, ImageData, ImageFormat, LaneInvasionEvent, LaneMarkingType,
    PointCloudData, SensorDataCallback, SensorPacket, SensorPayload, SensorSource, SensorSpec,
    SensorType, Transform, Vector3, WorldSnapshot, LIDAR_POINT_STRIDE,
};
use parking_lot::Mutex;
use slab::Slab;
use tracing::{debug, trace};

use crate::mock_world::ScriptedEvents;

/// Meters per degree of latitude/longitude around the geo-reference origin
const METERS_PER_DEGREE: f64 = 111_319.49;

/// Points produced by one lidar sweep
const LIDAR_POINTS_PER_SWEEP: usize = 2048;

/// One registered sensor
struct SensorSlot {
    sensor_id: String,
    sensor_type: SensorType,
    blueprint: String,
    parent: ActorId,
    transform: Transform,
    attributes: HashMap<String, String>,
    callback: Option<SensorDataCallback>,
}

impl SensorSlot {
    fn attr_u32(&self, key: &str, default: u32) -> u32 {
        self.attributes
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn attr_f64(&self, key: &str, default: f64) -> f64 {
        self.attributes
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

/// Registry of every spawned sensor
#[derive(Default)]
pub(crate) struct SensorHub {
    slots: Mutex<Slab<SensorSlot>>,
}

impl SensorHub {
    pub fn register(
        &self,
        spec: &SensorSpec,
        sensor_type: SensorType,
        parent: ActorId,
        actor_id: ActorId,
    ) -> usize {
        let sensor_id = format!("{}#{}", spec.blueprint, actor_id);
        self.slots.lock().insert(SensorSlot {
            sensor_id,
            sensor_type,
            blueprint: spec.blueprint.clone(),
            parent,
            transform: spec.transform,
            attributes: spec.attributes.clone(),
            callback: None,
        })
    }

    pub fn sensor_count(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn listening_count(&self) -> usize {
        self.slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.callback.is_some())
            .count()
    }

    /// Stop every sensor attached to `parent`
    pub fn detach_parent(&self, parent: ActorId) {
        let mut slots = self.slots.lock();
        for (_, slot) in slots.iter_mut().filter(|(_, s)| s.parent == parent) {
            slot.callback = None;
        }
    }

    /// Deliver one tick worth of sensor data
    ///
    /// Callbacks run with the registry locked.
    pub fn deliver(&self, snapshot: &WorldSnapshot, events: &ScriptedEvents) {
        let slots = self.slots.lock();
        let frame = snapshot.timestamp.frame;
        let timestamp = snapshot.timestamp.elapsed_seconds;

        for (_, slot) in slots.iter() {
            let Some(callback) = slot.callback.as_ref() else {
                continue;
            };
            let Some(parent) = snapshot.actors.iter().find(|a| a.id == slot.parent) else {
                continue;
            };

            let payload = match slot.sensor_type {
                SensorType::Gnss => Some(SensorPayload::Gnss(gnss_fix(&parent.transform))),
                SensorType::Collision => events.collision.as_ref().map(|(other, impulse)| {
                    SensorPayload::Collision(CollisionEvent {
                        other_actor: other.clone(),
                        normal_impulse: *impulse,
                    })
                }),
                SensorType::LaneInvasion => events
                    .lane_invasion
                    .then(|| SensorPayload::LaneInvasion(lane_invasion(frame))),
                SensorType::Camera => Some(SensorPayload::Image(camera_frame(
                    slot,
                    frame,
                    parent.transform.rotation.yaw,
                ))),
                SensorType::Lidar => Some(SensorPayload::PointCloud(lidar_sweep(slot, frame))),
            };

            if let Some(payload) = payload {
                trace!(sensor_id = %slot.sensor_id, frame, "mock packet sent");
                callback(SensorPacket {
                    sensor_id: slot.sensor_id.clone(),
                    sensor_type: slot.sensor_type,
                    timestamp,
                    frame,
                    payload,
                });
            }
        }
    }
}

/// Mock sensor
///
/// Handle to one slot of the simulator's sensor registry.
pub struct MockSensor {
    sensor_id: String,
    sensor_type: SensorType,
    key: usize,
    hub: Arc<SensorHub>,
}

impl MockSensor {
    pub(crate) fn new(hub: Arc<SensorHub>, key: usize) -> Option<Self> {
        let (sensor_id, sensor_type) = {
            let slots = hub.slots.lock();
            let slot = slots.get(key)?;
            (slot.sensor_id.clone(), slot.sensor_type)
        };
        Some(Self {
            sensor_id,
            sensor_type,
            key,
            hub,
        })
    }

    /// Blueprint this sensor was spawned from
    pub fn blueprint(&self) -> Option<String> {
        let slots = self.hub.slots.lock();
        self.owned_slot(&slots).map(|slot| slot.blueprint.clone())
    }

    /// Slab keys are reused after removal; the sensor id tells our slot apart
    fn owned_slot<'a>(&self, slots: &'a Slab<SensorSlot>) -> Option<&'a SensorSlot> {
        slots
            .get(self.key)
            .filter(|slot| slot.sensor_id == self.sensor_id)
    }

    fn owned_slot_mut<'a>(&self, slots: &'a mut Slab<SensorSlot>) -> Option<&'a mut SensorSlot> {
        slots
            .get_mut(self.key)
            .filter(|slot| slot.sensor_id == self.sensor_id)
    }
}

impl SensorSource for MockSensor {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn listen(&self, callback: SensorDataCallback) {
        let mut slots = self.hub.slots.lock();
        let Some(slot) = self.owned_slot_mut(&mut slots) else {
            return;
        };
        // Idempotent: if already listening, keep the first callback
        if slot.callback.is_none() {
            slot.callback = Some(callback);
            debug!(sensor_id = %self.sensor_id, "mock sensor listening");
        }
    }

    fn stop(&self) {
        let mut slots = self.hub.slots.lock();
        if let Some(slot) = self.owned_slot_mut(&mut slots) {
            slot.callback = None;
        }
    }

    fn is_listening(&self) -> bool {
        let slots = self.hub.slots.lock();
        self.owned_slot(&slots)
            .is_some_and(|slot| slot.callback.is_some())
    }

    fn destroy(&self) {
        let mut slots = self.hub.slots.lock();
        if self.owned_slot(&slots).is_some() {
            slots.remove(self.key);
            debug!(sensor_id = %self.sensor_id, "mock sensor destroyed");
        }
    }
}

fn gnss_fix(transform: &Transform) -> GnssData {
    let l = transform.location;
    GnssData {
        latitude: -l.y / METERS_PER_DEGREE,
        longitude: l.x / METERS_PER_DEGREE,
        altitude: l.z,
    }
}

fn lane_invasion(frame: u64) -> LaneInvasionEvent {
    let crossed_markings = if frame % 2 == 0 {
        vec![LaneMarkingType::Broken]
    } else {
        vec![
            LaneMarkingType::Solid,
            LaneMarkingType::Broken,
            LaneMarkingType::Solid,
        ]
    };
    LaneInvasionEvent { crossed_markings }
}

/// Semantic tags used by the synthetic camera
const TAG_ROAD_LINE: u8 = 6;
const TAG_ROAD: u8 = 7;
const TAG_SKY: u8 = 13;

/// BGRA frame: sky above the horizon, road below, one lane marking that
/// slides with the parent's yaw
fn camera_frame(slot: &SensorSlot, frame: u64, yaw: f64) -> ImageData {
    let width = slot.attr_u32("image_size_x", 800).max(1);
    let height = slot.attr_u32("image_size_y", 600).max(1);
    let w = width as usize;
    let h = height as usize;
    let horizon = h / 2;

    let offset = (yaw + slot.transform.rotation.yaw).rem_euclid(360.0) / 360.0;
    let lane_x = ((offset * w as f64) as usize + frame as usize) % w;

    let mut data = vec![0u8; w * h * 4];
    for (y, row) in data.chunks_exact_mut(w * 4).enumerate() {
        let below = y >= horizon;
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let on_lane = below && x.abs_diff(lane_x) < 3;
            let bgr = match slot.blueprint.as_str() {
                "sensor.camera.depth" => depth_pixel(y, h, horizon),
                "sensor.camera.semantic_segmentation" => {
                    let tag = match (below, on_lane) {
                        (false, _) => TAG_SKY,
                        (true, true) => TAG_ROAD_LINE,
                        (true, false) => TAG_ROAD,
                    };
                    [0, 0, tag]
                }
                _ => match (below, on_lane) {
                    (false, _) => [235, 206, 135],
                    (true, true) => [255, 255, 255],
                    (true, false) => [90, 90, 90],
                },
            };
            px.copy_from_slice(&[bgr[0], bgr[1], bgr[2], 255]);
        }
    }

    ImageData {
        width,
        height,
        format: ImageFormat::Bgra8,
        data: Bytes::from(data),
    }
}

/// Depth encoded over 24 bits in R (low), G, B (high), returned as [B, G, R]
fn depth_pixel(y: usize, h: usize, horizon: usize) -> [u8; 3] {
    let normalized = if y < horizon {
        1.0
    } else {
        let rows_below = (h - horizon).max(1) as f64;
        0.05 * (h - y) as f64 / rows_below
    };
    let encoded = (normalized * 16_777_215.0) as u32;
    let r = (encoded & 0xff) as u8;
    let g = ((encoded >> 8) & 0xff) as u8;
    let b = ((encoded >> 16) & 0xff) as u8;
    [b, g, r]
}

/// One ray-cast sweep, points packed as f32 (x, y, z, intensity)
fn lidar_sweep(slot: &SensorSlot, frame: u64) -> PointCloudData {
    let range = slot.attr_f64("range", 50.0);
    let phase = frame as f64 * 0.1;

    let mut points: Vec<f32> = Vec::with_capacity(LIDAR_POINTS_PER_SWEEP * 4);
    for i in 0..LIDAR_POINTS_PER_SWEEP {
        let angle = TAU * i as f64 / LIDAR_POINTS_PER_SWEEP as f64;
        let r = range * (0.5 + 0.25 * (4.0 * angle + phase).sin());
        let v = Vector3::new(r * angle.cos(), r * angle.sin(), -1.5);
        points.extend_from_slice(&[
            v.x as f32,
            v.y as f32,
            v.z as f32,
            (1.0 - r / range) as f32,
        ]);
    }

    PointCloudData {
        num_points: LIDAR_POINTS_PER_SWEEP as u32,
        point_stride: LIDAR_POINT_STRIDE,
        data: Bytes::copy_from_slice(bytemuck::cast_slice(&points)),
    }
}
