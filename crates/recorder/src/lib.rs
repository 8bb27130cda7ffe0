//! # Recorder
//!
//! 帧录制模块。
//!
//! 负责：
//! - 从传感器回调接收解码后的帧（不做 I/O）
//! - 在独立 worker 中写盘（`%08d.png`）
//! - 队列满时丢帧并计数，不阻塞渲染主循环

pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{FrameCallback, FrameSink, RecordedFrame};
pub use error::{RecorderError, Result};
pub use handle::RecorderHandle;
pub use metrics::{RecorderMetrics, RecorderMetricsSnapshot};
pub use sinks::ImageFileSink;
