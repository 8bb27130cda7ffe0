//! Headless presenter

use image::RgbImage;
use metrics::counter;
use tracing::debug;

use crate::canvas::{Canvas, TextRun};

/// Fixed-size output surface owned by the render loop
pub struct Display {
    width: u32,
    height: u32,
    presented: u64,
    last_frame: Option<(RgbImage, Vec<TextRun>)>,
    open: bool,
}

impl Display {
    pub fn new(width: u32, height: u32) -> Self {
        debug!(width, height, "display opened");
        Self {
            width,
            height,
            presented: 0,
            last_frame: None,
            open: true,
        }
    }

    /// Fresh canvas matching the display size
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Flip a composed frame onto the display
    pub fn present(&mut self, canvas: Canvas) {
        if !self.open {
            return;
        }
        self.presented += 1;
        self.last_frame = Some(canvas.into_parts());
        counter!("carla_hud_frames_rendered_total").increment(1);
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&(RgbImage, Vec<TextRun>)> {
        self.last_frame.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            self.last_frame = None;
            debug!(frames = self.presented, "display closed");
        }
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_until_closed() {
        let mut display = Display::new(8, 4);
        let canvas = display.canvas();
        assert_eq!((canvas.width(), canvas.height()), (8, 4));

        display.present(canvas);
        assert_eq!(display.frames_presented(), 1);
        assert!(display.last_frame().is_some());

        display.close();
        display.present(display.canvas());
        assert_eq!(display.frames_presented(), 1);
        assert!(!display.is_open());
    }
}
