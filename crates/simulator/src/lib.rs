//! # Simulator
//!
//! Event Source boundary of the HUD client.
//!
//! Responsibilities:
//! - Define the `SimulatorClient` trait (world queries, actor lifecycle, tick delivery)
//! - Provide an in-process `MockSimulator` that ticks on its own thread
//! - Provide sensor sources that honour synchronous `stop`/`destroy`
//! - Provide stand-in navigation agents implementing `DrivingAgent`

pub mod client;
pub mod error;
pub mod mock_client;
pub mod mock_sensor;
mod mock_world;
pub mod navigation;

pub use client::{
    wildcard_match, ActorBlueprint, SimulatorClient, SpawnRequest, TickCallback, TickCallbackId,
};
pub use contracts::{ActorId, SensorSource, SensorSpawner};
pub use error::{Result, SimulatorError};
pub use mock_client::MockSimulator;
pub use mock_sensor::MockSensor;
pub use navigation::{BasicAgent, BehaviorAgent, LocalPlanner, RoamingAgent};
