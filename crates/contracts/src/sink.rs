//! FrameSink trait - Recorder output interface
//!
//! Defines the abstract interface for recording sinks.

use std::sync::Arc;

use bytes::Bytes;

use crate::ContractError;

/// One decoded raster frame queued for persistence
#[derive(Debug, Clone)]
pub struct RecordedFrame {
    /// Simulation frame index, used as the file name
    pub frame: u64,
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8 pixels
    pub rgb: Bytes,
}

/// Hand-off used by sensor handlers to queue a frame without doing I/O
pub type FrameCallback = Arc<dyn Fn(RecordedFrame) + Send + Sync>;

/// Frame output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(FrameSink: Send)]
pub trait LocalFrameSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one frame
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, frame: &RecordedFrame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
