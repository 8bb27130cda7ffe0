//! Non-owning sensor callbacks
//!
//! A handler captures only a `Weak` reference to its wrapper state. When the
//! wrapper is gone the upgrade fails and the event is counted and ignored, so
//! a late delivery can never observe freed state.

use std::sync::{Arc, Weak};

use contracts::{SensorDataCallback, SensorPacket, SensorType};
use tracing::trace;

use crate::metrics::SensorMetrics;
use crate::notification::NotificationSender;

/// Dependencies shared by every sensor wrapper
#[derive(Debug, Clone)]
pub struct SensorContext {
    pub notifications: NotificationSender,
    pub metrics: Arc<SensorMetrics>,
}

impl SensorContext {
    pub fn new(notifications: NotificationSender) -> Self {
        Self {
            notifications,
            metrics: Arc::new(SensorMetrics::new()),
        }
    }
}

/// Build a callback that forwards packets to `on_packet` while `target` lives
pub fn weak_handler<T, F>(
    target: &Arc<T>,
    sensor_type: SensorType,
    metrics: Arc<SensorMetrics>,
    on_packet: F,
) -> SensorDataCallback
where
    T: Send + Sync + 'static,
    F: Fn(&T, SensorPacket) + Send + Sync + 'static,
{
    let weak: Weak<T> = Arc::downgrade(target);
    Arc::new(move |packet: SensorPacket| {
        let Some(target) = weak.upgrade() else {
            metrics.record_stale(sensor_type);
            trace!(
                sensor_id = %packet.sensor_id,
                frame = packet.frame,
                "stale sensor callback suppressed"
            );
            return;
        };
        metrics.record_event(sensor_type);
        on_packet(&target, packet);
    })
}
