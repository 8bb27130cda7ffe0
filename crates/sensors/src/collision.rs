//! Collision sensor
//!
//! Keeps a bounded history of `(frame, impulse magnitude)` pairs and posts a
//! notification naming the other actor.

use std::collections::BTreeMap;

use contracts::{actor_display_name, SensorPacket, SensorPayload};
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use tracing::trace;

use crate::handler::SensorContext;
use crate::macros::define_sensor_wrapper;
use crate::notification::NotificationSender;

/// Most recent collision events kept; older ones are evicted first
pub const COLLISION_HISTORY_CAPACITY: usize = 4000;

/// Longest actor name shown in the notification
const ACTOR_NAME_LIMIT: usize = 250;

/// Observation state written by the collision handler
pub struct CollisionState {
    history: Mutex<HeapRb<(u64, f64)>>,
    notifications: NotificationSender,
}

impl CollisionState {
    fn new(ctx: &SensorContext) -> Self {
        Self {
            history: Mutex::new(HeapRb::new(COLLISION_HISTORY_CAPACITY)),
            notifications: ctx.notifications.clone(),
        }
    }

    fn on_packet(&self, packet: SensorPacket) {
        let SensorPayload::Collision(event) = packet.payload else {
            trace!(sensor_id = %packet.sensor_id, "unexpected payload on collision sensor");
            return;
        };

        let impulse = nalgebra::Vector3::new(
            event.normal_impulse.x,
            event.normal_impulse.y,
            event.normal_impulse.z,
        );
        let intensity = impulse.norm();
        self.history.lock().push_overwrite((packet.frame, intensity));

        let actor = actor_display_name(&event.other_actor, ACTOR_NAME_LIMIT);
        self.notifications.notify(format!("Collision with '{actor}'"));
        trace!(frame = packet.frame, intensity, "collision recorded");
    }
}

define_sensor_wrapper!(
    CollisionSensor,
    CollisionState,
    "sensor.other.collision",
    on_packet
);

impl CollisionSensor {
    /// Raw history, oldest first
    pub fn history(&self) -> Vec<(u64, f64)> {
        self.state.history.lock().iter().copied().collect()
    }

    pub fn history_len(&self) -> usize {
        self.state.history.lock().occupied_len()
    }

    /// Impulse magnitudes summed per frame
    pub fn collision_history(&self) -> BTreeMap<u64, f64> {
        let history = self.state.history.lock();
        let mut per_frame = BTreeMap::new();
        for &(frame, intensity) in history.iter() {
            *per_frame.entry(frame).or_insert(0.0) += intensity;
        }
        per_frame
    }
}
