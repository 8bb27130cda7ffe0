//! Recorder error types

use std::path::PathBuf;

use thiserror::Error;

/// Recorder-specific errors
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Output directory could not be prepared
    #[error("failed to prepare output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Frame buffer does not match its declared size
    #[error("frame {frame}: expected {expected} bytes of RGB8, got {actual}")]
    FrameSize {
        frame: u64,
        expected: usize,
        actual: usize,
    },

    /// Image encoding or write failure
    #[error("failed to save frame {frame}: {source}")]
    Encode {
        frame: u64,
        #[source]
        source: image::ImageError,
    },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl RecorderError {
    pub fn output_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
