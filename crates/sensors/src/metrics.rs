//! Sensor handler metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::SensorType;
use metrics::counter;

/// Counters shared by every sensor handler
///
/// Handlers only touch atomics and the global `metrics` recorder, never locks.
#[derive(Debug, Default)]
pub struct SensorMetrics {
    /// Events handed to a live wrapper
    pub events_received: AtomicU64,

    /// Events that arrived after their wrapper was gone
    pub stale_callbacks: AtomicU64,

    /// Images or point clouds that failed to decode
    pub decode_errors: AtomicU64,

    /// Frames handed to the recorder
    pub frames_queued: AtomicU64,
}

impl SensorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, sensor_type: SensorType) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        counter!("carla_hud_sensor_events_total", "sensor" => sensor_type.as_str()).increment(1);
    }

    pub fn record_stale(&self, sensor_type: SensorType) {
        self.stale_callbacks.fetch_add(1, Ordering::Relaxed);
        counter!("carla_hud_stale_callbacks_total", "sensor" => sensor_type.as_str()).increment(1);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        counter!("carla_hud_decode_errors_total").increment(1);
    }

    pub fn record_frame_queued(&self) {
        self.frames_queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> SensorMetricsSnapshot {
        SensorMetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            stale_callbacks: self.stale_callbacks.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            frames_queued: self.frames_queued.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `SensorMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorMetricsSnapshot {
    pub events_received: u64,
    pub stale_callbacks: u64,
    pub decode_errors: u64,
    pub frames_queued: u64,
}
