//! Recorder metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use metrics::counter;

/// Metrics for one recorder worker
#[derive(Debug, Default)]
pub struct RecorderMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Frames written to disk
    recorded: AtomicU64,
    /// Write failures
    failures: AtomicU64,
    /// Frames dropped because the queue was full or closed
    dropped: AtomicU64,
}

impl RecorderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    pub fn inc_recorded(&self) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
        counter!("carla_hud_frames_recorded_total").increment(1);
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        counter!("carla_hud_record_failures_total").increment(1);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        counter!("carla_hud_frames_dropped_total").increment(1);
    }

    pub fn snapshot(&self) -> RecorderMetricsSnapshot {
        RecorderMetricsSnapshot {
            queue_len: self.queue_len(),
            recorded: self.recorded(),
            failures: self.failures(),
            dropped: self.dropped(),
        }
    }
}

/// Snapshot of recorder metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderMetricsSnapshot {
    pub queue_len: usize,
    pub recorded: u64,
    pub failures: u64,
    pub dropped: u64,
}
