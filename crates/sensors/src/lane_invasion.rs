//! Lane invasion sensor
//!
//! Stores nothing; every event becomes a transient notification.

use contracts::{LaneMarkingType, SensorPacket, SensorPayload};
use tracing::trace;

use crate::handler::SensorContext;
use crate::macros::define_sensor_wrapper;
use crate::notification::NotificationSender;

pub struct LaneInvasionState {
    notifications: NotificationSender,
}

impl LaneInvasionState {
    fn new(ctx: &SensorContext) -> Self {
        Self {
            notifications: ctx.notifications.clone(),
        }
    }

    fn on_packet(&self, packet: SensorPacket) {
        let SensorPayload::LaneInvasion(event) = packet.payload else {
            trace!(sensor_id = %packet.sensor_id, "unexpected payload on lane invasion sensor");
            return;
        };
        if event.crossed_markings.is_empty() {
            return;
        }
        self.notifications
            .notify(crossed_line_text(&event.crossed_markings));
    }
}

/// `Crossed line 'Solid' and 'Broken'`, each marking type listed once
pub fn crossed_line_text(markings: &[LaneMarkingType]) -> String {
    let mut seen: Vec<LaneMarkingType> = Vec::with_capacity(markings.len());
    for marking in markings {
        if !seen.contains(marking) {
            seen.push(*marking);
        }
    }
    let parts: Vec<String> = seen.iter().map(|m| format!("'{m}'")).collect();
    format!("Crossed line {}", parts.join(" and "))
}

define_sensor_wrapper!(
    LaneInvasionSensor,
    LaneInvasionState,
    "sensor.other.lane_invasion",
    on_packet
);
