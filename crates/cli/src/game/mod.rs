//! Client game: world, keyboard and the render loop.

mod keyboard;
mod runner;
mod world;

pub use keyboard::InputEvent;
pub use runner::{ExitReason, GameLoop};
