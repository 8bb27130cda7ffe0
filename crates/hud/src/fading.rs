//! Fading notification text

use std::time::Duration;

use crate::canvas::{Canvas, Color, Rect, BLACK, WHITE};

/// A notification that fades out over its remaining seconds
#[derive(Debug, Clone)]
pub struct FadingText {
    pos: (i32, i32),
    dim: (u32, u32),
    text: String,
    color: Color,
    seconds_left: f64,
}

impl FadingText {
    pub fn new(dim: (u32, u32), pos: (i32, i32)) -> Self {
        Self {
            pos,
            dim,
            text: String::new(),
            color: WHITE,
            seconds_left: 0.0,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>, color: Color, seconds: f64) {
        self.text = text.into();
        self.color = color;
        self.seconds_left = seconds.max(0.0);
    }

    /// Count down by the wall-clock time since the previous frame
    pub fn tick(&mut self, delta: Duration) {
        self.seconds_left = (self.seconds_left - delta.as_secs_f64()).max(0.0);
    }

    pub fn seconds_left(&self) -> f64 {
        self.seconds_left
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// `clamp(500 * seconds_left, 0, 255)`
    pub fn alpha(&self) -> u8 {
        (500.0 * self.seconds_left).clamp(0.0, 255.0) as u8
    }

    pub fn render(&self, canvas: &mut Canvas) {
        let alpha = self.alpha();
        if alpha == 0 {
            return;
        }
        canvas.fill_rect(
            Rect::new(self.pos.0, self.pos.1, self.dim.0, self.dim.1),
            BLACK,
            alpha,
        );
        canvas.draw_text(self.pos.0 + 10, self.pos.1 + 11, &self.text, self.color, alpha);
    }
}
