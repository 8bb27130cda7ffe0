//! RecorderHandle - owns a frame sink behind an isolated queue and worker task

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use contracts::{FrameCallback, FrameSink, RecordedFrame};

use crate::metrics::RecorderMetrics;

/// Handle to a running recorder worker
pub struct RecorderHandle {
    name: Arc<str>,
    tx: mpsc::Sender<RecordedFrame>,
    metrics: Arc<RecorderMetrics>,
    worker_handle: JoinHandle<()>,
}

impl RecorderHandle {
    /// Spawn the worker task on the current tokio runtime
    pub fn spawn<S: FrameSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name: Arc<str> = Arc::from(sink.name());
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(RecorderMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = Arc::clone(&name);
        let worker_handle = tokio::spawn(async move {
            recorder_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<RecorderMetrics> {
        &self.metrics
    }

    /// Queue a frame without blocking
    ///
    /// Returns false if the frame was dropped.
    pub fn try_send(&self, frame: RecordedFrame) -> bool {
        match enqueue(&self.tx, &self.metrics, frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(f)) => {
                warn!(sink = %self.name, frame = f.frame, "Recorder queue full, frame dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(f)) => {
                error!(sink = %self.name, frame = f.frame, "Recorder worker closed unexpectedly");
                false
            }
        }
    }

    /// Callback for sensor handlers
    ///
    /// Holds only a weak sender: once the handle is shut down, frames handed
    /// to the callback are counted as dropped. Runs on the simulator's
    /// delivery thread, so drops are only counted and traced; totals are
    /// reported from `metrics()`.
    pub fn frame_callback(&self) -> FrameCallback {
        let tx = self.tx.downgrade();
        let metrics = Arc::clone(&self.metrics);
        let name = Arc::clone(&self.name);
        Arc::new(move |frame: RecordedFrame| {
            let Some(tx) = tx.upgrade() else {
                metrics.inc_dropped();
                trace!(sink = %name, frame = frame.frame, "recorder gone, frame dropped");
                return;
            };
            if let Err(e) = enqueue(&tx, &metrics, frame) {
                let frame = match &e {
                    mpsc::error::TrySendError::Full(f) | mpsc::error::TrySendError::Closed(f) => {
                        f.frame
                    }
                };
                trace!(sink = %name, frame, "recorder queue unavailable, frame dropped");
            }
        })
    }

    /// Drain the queue and close the sink
    #[instrument(name = "recorder_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Recorder task panicked");
        }
        debug!(sink = %self.name, "RecorderHandle shutdown complete");
    }
}

/// Queue without blocking; a rejected frame is counted as dropped
fn enqueue(
    tx: &mpsc::Sender<RecordedFrame>,
    metrics: &RecorderMetrics,
    frame: RecordedFrame,
) -> Result<(), mpsc::error::TrySendError<RecordedFrame>> {
    match tx.try_send(frame) {
        Ok(()) => {
            metrics.set_queue_len(tx.max_capacity() - tx.capacity());
            Ok(())
        }
        Err(e) => {
            metrics.inc_dropped();
            Err(e)
        }
    }
}

#[instrument(name = "recorder_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn recorder_worker<S: FrameSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<RecordedFrame>,
    metrics: Arc<RecorderMetrics>,
    name: Arc<str>,
) {
    debug!("Recorder worker started");

    while let Some(frame) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&frame).await {
            Ok(()) => metrics.inc_recorded(),
            Err(e) => {
                metrics.inc_failures();
                error!(frame = frame.frame, error = %e, "Write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "Close failed on shutdown");
    }

    debug!("Recorder worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::ContractError;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct MockSink {
        written: Arc<AtomicU64>,
        closed: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(delay_ms: u64, should_fail: bool) -> (Self, Arc<AtomicU64>, Arc<AtomicU64>) {
            let written = Arc::new(AtomicU64::new(0));
            let closed = Arc::new(AtomicU64::new(0));
            let sink = Self {
                written: Arc::clone(&written),
                closed: Arc::clone(&closed),
                should_fail,
                delay_ms,
            };
            (sink, written, closed)
        }
    }

    impl FrameSink for MockSink {
        fn name(&self) -> &str {
            "mock"
        }

        async fn write(&mut self, frame: &RecordedFrame) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write("mock", format!("frame {}", frame.frame)));
            }
            self.written.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn frame(frame: u64) -> RecordedFrame {
        RecordedFrame {
            frame,
            width: 1,
            height: 1,
            rgb: Bytes::from_static(&[0, 0, 0]),
        }
    }

    #[tokio::test]
    async fn test_records_all_frames_then_closes() {
        let (sink, written, closed) = MockSink::new(0, false);
        let handle = RecorderHandle::spawn(sink, 10);
        assert_eq!(handle.name(), "mock");

        for i in 0..5 {
            assert!(handle.try_send(frame(i)));
        }
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        assert_eq!(written.load(Ordering::Relaxed), 5);
        assert_eq!(closed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.snapshot().recorded, 5);
    }

    #[tokio::test]
    async fn test_slow_sink_drops_instead_of_blocking() {
        let (sink, _written, _closed) = MockSink::new(100, false);
        let handle = RecorderHandle::spawn(sink, 2);

        let accepted = (0..10).filter(|i| handle.try_send(frame(*i))).count();

        assert!(accepted < 10);
        assert_eq!(handle.metrics().dropped(), (10 - accepted) as u64);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_worker() {
        let (sink, _written, closed) = MockSink::new(0, true);
        let handle = RecorderHandle::spawn(sink, 10);

        for i in 0..3 {
            handle.try_send(frame(i));
        }
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        assert_eq!(metrics.failures(), 3);
        assert_eq!(metrics.recorded(), 0);
        assert_eq!(closed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_callback_from_other_thread() {
        let (sink, written, _closed) = MockSink::new(0, false);
        let handle = RecorderHandle::spawn(sink, 16);
        let callback = handle.frame_callback();

        std::thread::spawn(move || {
            for i in 0..4 {
                callback(frame(i));
            }
        })
        .join()
        .unwrap();

        handle.shutdown().await;
        assert_eq!(written.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn test_callback_after_shutdown_counts_drop() {
        let (sink, _written, _closed) = MockSink::new(0, false);
        let handle = RecorderHandle::spawn(sink, 4);
        let callback = handle.frame_callback();
        let metrics = Arc::clone(handle.metrics());

        handle.shutdown().await;
        callback(frame(9));

        assert_eq!(metrics.dropped(), 1);
    }

    /// Collects the level of every event seen on the current thread
    struct LevelCapture(Arc<Mutex<Vec<Level>>>);

    impl<S: Subscriber> Layer<S> for LevelCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[tokio::test]
    async fn test_full_queue_callback_only_traces() {
        let (sink, _written, _closed) = MockSink::new(5_000, false);
        let handle = RecorderHandle::spawn(sink, 1);
        let callback = handle.frame_callback();
        let metrics = Arc::clone(handle.metrics());

        let levels = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&levels);
        std::thread::spawn(move || {
            let subscriber = tracing_subscriber::registry().with(LevelCapture(captured));
            tracing::subscriber::with_default(subscriber, || {
                for i in 0..5 {
                    callback(frame(i));
                }
            });
        })
        .join()
        .unwrap();

        // one frame in the worker at most, one in the queue
        assert!(metrics.dropped() >= 3);
        let levels = levels.lock().unwrap();
        assert!(!levels.is_empty());
        assert!(levels.iter().all(|l| *l == Level::TRACE), "{levels:?}");
    }
}
