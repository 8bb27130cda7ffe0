//! # HUD
//!
//! Frame compositor: reads the latest value of every observation cache once
//! per frame, formats it and draws it on a canvas.
//!
//! - Info panel (toggleable) with speed, heading, location, GNSS, controls,
//!   a collision sparkline and nearby vehicles
//! - Fading notification fed by the sensors' mailbox
//! - Help overlay
//! - Server and client frame rate clocks

pub mod canvas;
pub mod display;
pub mod fading;
pub mod format;
pub mod fps;
pub mod help;
mod hud;
pub mod info;
pub mod snapshot;

pub use canvas::{Canvas, Color, Rect, TextRun};
pub use display::Display;
pub use fading::FadingText;
pub use format::{collision_sparkline, format_sim_time, heading_letters};
pub use fps::{FpsClock, ServerClock, ServerClockSnapshot};
pub use help::HelpText;
pub use hud::Hud;
pub use info::{build_info, InfoItem};
pub use snapshot::FrameSnapshot;
