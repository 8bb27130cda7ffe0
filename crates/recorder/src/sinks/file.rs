//! ImageFileSink - writes each frame as `output_dir/%08d.png`

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, FrameSink, RecordedFrame};
use tracing::{debug, error, instrument};

use crate::error::{RecorderError, Result};

/// Sink that saves frames as PNG files keyed by simulation frame
pub struct ImageFileSink {
    name: String,
    output_dir: PathBuf,
    dir_ready: bool,
}

impl ImageFileSink {
    /// The directory is created lazily on the first write
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            output_dir: output_dir.into(),
            dir_ready: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `output_dir/00000042.png` for frame 42
    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.output_dir.join(format!("{frame:08}.png"))
    }

    fn save_frame(&mut self, frame: &RecordedFrame) -> Result<()> {
        let expected = frame.width as usize * frame.height as usize * 3;
        if frame.rgb.len() != expected {
            return Err(RecorderError::FrameSize {
                frame: frame.frame,
                expected,
                actual: frame.rgb.len(),
            });
        }

        if !self.dir_ready {
            fs::create_dir_all(&self.output_dir)
                .map_err(|e| RecorderError::output_dir(&self.output_dir, e))?;
            self.dir_ready = true;
        }

        image::save_buffer(
            self.frame_path(frame.frame),
            &frame.rgb,
            frame.width,
            frame.height,
            image::ColorType::Rgb8,
        )
        .map_err(|source| RecorderError::Encode {
            frame: frame.frame,
            source,
        })
    }
}

impl FrameSink for ImageFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "image_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame = frame.frame)
    )]
    async fn write(&mut self, frame: &RecordedFrame) -> std::result::Result<(), ContractError> {
        self.save_frame(frame).map_err(|e| {
            error!(sink = %self.name, frame = frame.frame, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    async fn flush(&mut self) -> std::result::Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "image_sink_close", skip(self))]
    async fn close(&mut self) -> std::result::Result<(), ContractError> {
        debug!(sink = %self.name, dir = %self.output_dir.display(), "ImageFileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    fn frame(frame: u64, width: u32, height: u32) -> RecordedFrame {
        RecordedFrame {
            frame,
            width,
            height,
            rgb: Bytes::from(vec![128u8; (width * height * 3) as usize]),
        }
    }

    #[tokio::test]
    async fn test_writes_zero_padded_png() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("_out");
        let mut sink = ImageFileSink::new("images", &out);

        sink.write(&frame(42, 4, 2)).await.unwrap();
        sink.close().await.unwrap();

        let path = out.join("00000042.png");
        assert!(path.exists());
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(3, 1).0, [128, 128, 128]);
    }

    #[tokio::test]
    async fn test_rejects_short_buffer() {
        let dir = tempdir().unwrap();
        let mut sink = ImageFileSink::new("images", dir.path());
        let mut bad = frame(1, 4, 4);
        bad.rgb = Bytes::from_static(&[0, 0, 0]);

        let err = sink.write(&bad).await.unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
        assert!(!sink.frame_path(1).exists());
    }

    #[test]
    fn test_frame_path() {
        let sink = ImageFileSink::new("images", "_out");
        assert_eq!(sink.frame_path(7), PathBuf::from("_out/00000007.png"));
        assert_eq!(
            sink.frame_path(123_456_789),
            PathBuf::from("_out/123456789.png")
        );
    }
}
