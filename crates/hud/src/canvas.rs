//! Drawing surface for one presented frame
//!
//! Shapes are rasterised into an `RgbImage`. Text is kept as positioned runs
//! so the presenter decides how to draw glyphs.

use image::{Rgb, RgbImage};
use sensors::Surface;

pub type Color = [u8; 3];

pub const WHITE: Color = [255, 255, 255];
pub const BLACK: Color = [0, 0, 0];
pub const RED: Color = [255, 0, 0];
pub const ORANGE: Color = [255, 136, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// A line of text placed on the frame
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub color: Color,
    pub alpha: u8,
}

pub struct Canvas {
    image: RgbImage,
    texts: Vec<TextRun>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
            texts: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }

    pub fn into_parts(self) -> (RgbImage, Vec<TextRun>) {
        (self.image, self.texts)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0)
    }

    /// Copy a decoded sensor surface at the origin, clipped to the canvas
    pub fn blit_surface(&mut self, surface: &Surface) {
        let w = surface.width.min(self.width());
        let h = surface.height.min(self.height());
        let stride = surface.width as usize * 3;
        for y in 0..h {
            let row = y as usize * stride;
            for x in 0..w {
                let i = row + x as usize * 3;
                let px = [surface.rgb[i], surface.rgb[i + 1], surface.rgb[i + 2]];
                self.image.put_pixel(x, y, Rgb(px));
            }
        }
    }

    /// Alpha-blend a solid rectangle
    pub fn fill_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, alpha);
            }
        }
    }

    /// Rectangle outline, `thickness` pixels wide on the inside
    pub fn stroke_rect(&mut self, rect: Rect, color: Color, thickness: u32) {
        let t = thickness.min(rect.w).min(rect.h);
        if t == 0 {
            return;
        }
        let (x, y, w, h) = (rect.x, rect.y, rect.w, rect.h);
        self.fill_rect(Rect::new(x, y, w, t), color, 255);
        self.fill_rect(Rect::new(x, y + (h - t) as i32, w, t), color, 255);
        self.fill_rect(Rect::new(x, y, t, h), color, 255);
        self.fill_rect(Rect::new(x + (w - t) as i32, y, t, h), color, 255);
    }

    /// Open polyline through `points`
    pub fn draw_polyline(&mut self, points: &[(f64, f64)], color: Color, width: u32) {
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            self.draw_line(
                (a.0 as i32, a.1 as i32),
                (b.0 as i32, b.1 as i32),
                color,
                width.max(1),
            );
        }
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: impl Into<String>, color: Color, alpha: u8) {
        self.texts.push(TextRun {
            x,
            y,
            text: text.into(),
            color,
            alpha,
        });
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Color, width: u32) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            for k in 0..width as i32 {
                self.put(x, y + k, color);
            }
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn put(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, alpha: u8) {
        let dst = self.image.get_pixel_mut(x, y);
        let a = alpha as u16;
        for (d, s) in dst.0.iter_mut().zip(color) {
            *d = ((s as u16 * a + *d as u16 * (255 - a)) / 255) as u8;
        }
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.w as i64).min(self.width() as i64);
        let y1 = (rect.y as i64 + rect.h as i64).min(self.height() as i64);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}
