//! Frame rate clocks

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use contracts::Timestamp;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};

/// Number of tick intervals averaged by `FpsClock::fps`
pub const FPS_WINDOW: usize = 10;

/// Measures the interval between consecutive ticks
pub struct FpsClock {
    last: Option<Instant>,
    intervals: HeapRb<Duration>,
    last_interval: Duration,
}

impl Default for FpsClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsClock {
    pub fn new() -> Self {
        Self {
            last: None,
            intervals: HeapRb::new(FPS_WINDOW),
            last_interval: Duration::ZERO,
        }
    }

    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    /// Record a tick at `now`; returns the time since the previous tick
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let interval = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        if self.last.is_some() {
            self.intervals.push_overwrite(interval);
        }
        self.last = Some(now);
        self.last_interval = interval;
        interval
    }

    /// Interval measured by the latest tick
    pub fn last_interval(&self) -> Duration {
        self.last_interval
    }

    /// Average frame rate over the last `FPS_WINDOW` intervals
    pub fn fps(&self) -> f64 {
        let count = self.intervals.occupied_len();
        let total: Duration = self.intervals.iter().sum();
        if count == 0 || total.is_zero() {
            return 0.0;
        }
        count as f64 / total.as_secs_f64()
    }
}

/// Server-side clock fed by the world tick callback
#[derive(Default)]
pub struct ServerClock {
    inner: Mutex<ServerClockState>,
}

#[derive(Default)]
struct ServerClockState {
    clock: FpsClock,
    frame: u64,
    simulation_time: f64,
}

/// Copy of the server clock taken by the HUD each frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServerClockSnapshot {
    pub fps: f64,
    pub frame: u64,
    pub simulation_time: f64,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_world_tick(&self, timestamp: Timestamp) {
        self.on_world_tick_at(timestamp, Instant::now());
    }

    pub fn on_world_tick_at(&self, timestamp: Timestamp, now: Instant) {
        let mut state = self.inner.lock();
        state.clock.tick_at(now);
        state.frame = timestamp.frame;
        state.simulation_time = timestamp.elapsed_seconds;
    }

    pub fn snapshot(&self) -> ServerClockSnapshot {
        let state = self.inner.lock();
        ServerClockSnapshot {
            fps: state.clock.fps(),
            frame: state.frame,
            simulation_time: state.simulation_time,
        }
    }
}

/// World tick callback holding only a weak reference to the clock
pub fn server_clock_callback(clock: &Arc<ServerClock>) -> Arc<dyn Fn(Timestamp) + Send + Sync> {
    let weak: Weak<ServerClock> = Arc::downgrade(clock);
    Arc::new(move |timestamp| {
        if let Some(clock) = weak.upgrade() {
            clock.on_world_tick(timestamp);
        }
    })
}
