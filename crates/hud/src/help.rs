//! Help overlay

use crate::canvas::{Canvas, Rect, BLACK, WHITE};

pub const HELP_LINES: &[&str] = &[
    "Automatic driving client with a live sensor HUD.",
    "",
    "Use ESC or Ctrl+Q to quit.",
    "",
    "    F1           : toggle HUD",
    "    H/?          : toggle help",
    "    C            : next weather",
    "    Shift+C      : previous weather",
    "    TAB          : change camera position",
    "    ` or N       : next sensor",
    "    R            : toggle recording images to disk",
];

const HELP_WIDTH: u32 = 680;
const LINE_HEIGHT: u32 = 22;

/// Centered keyboard reference, hidden by default
#[derive(Debug, Clone)]
pub struct HelpText {
    pos: (i32, i32),
    dim: (u32, u32),
    visible: bool,
}

impl HelpText {
    pub fn new(width: u32, height: u32) -> Self {
        let dim = (HELP_WIDTH, HELP_LINES.len() as u32 * LINE_HEIGHT + 12);
        let pos = (
            (0.5 * width as f64 - 0.5 * dim.0 as f64) as i32,
            (0.5 * height as f64 - 0.5 * dim.1 as f64) as i32,
        );
        Self {
            pos,
            dim,
            visible: false,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn render(&self, canvas: &mut Canvas) {
        if !self.visible {
            return;
        }
        canvas.fill_rect(
            Rect::new(self.pos.0, self.pos.1, self.dim.0, self.dim.1),
            BLACK,
            220,
        );
        for (i, line) in HELP_LINES.iter().enumerate() {
            canvas.draw_text(
                self.pos.0 + 22,
                self.pos.1 + (i as u32 * LINE_HEIGHT) as i32,
                *line,
                WHITE,
                220,
            );
        }
    }
}
