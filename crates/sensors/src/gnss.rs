//! GNSS sensor: last known latitude/longitude

use contracts::{GnssData, SensorPacket, SensorPayload};
use parking_lot::RwLock;
use tracing::trace;

use crate::handler::SensorContext;
use crate::macros::define_sensor_wrapper;

pub struct GnssState {
    fix: RwLock<GnssData>,
}

impl GnssState {
    fn new(_ctx: &SensorContext) -> Self {
        Self {
            fix: RwLock::new(GnssData::default()),
        }
    }

    fn on_packet(&self, packet: SensorPacket) {
        let SensorPayload::Gnss(fix) = packet.payload else {
            trace!(sensor_id = %packet.sensor_id, "unexpected payload on gnss sensor");
            return;
        };
        *self.fix.write() = fix;
    }
}

define_sensor_wrapper!(GnssSensor, GnssState, "sensor.other.gnss", on_packet);

impl GnssSensor {
    pub fn fix(&self) -> GnssData {
        *self.state.fix.read()
    }

    pub fn lat(&self) -> f64 {
        self.state.fix.read().latitude
    }

    pub fn lon(&self) -> f64 {
        self.state.fix.read().longitude
    }
}
