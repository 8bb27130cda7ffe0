//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the HUD client:
//! geometry, controls, sensor packets, world snapshots and the traits that
//! sit on the simulator boundary.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Simulation frame index (`u64`) orders events from one sensor
//! - Simulation elapsed seconds (f64) drive the HUD clock

mod agent;
mod blueprint;
mod control;
mod error;
mod geometry;
mod sensor;
mod sensor_source;
mod sink;
mod world;

pub use agent::*;
pub use blueprint::*;
pub use control::*;
pub use error::*;
pub use geometry::*;
pub use sensor::*;
pub use sensor_source::*;
pub use sink::*;
pub use world::*;
