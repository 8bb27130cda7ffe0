//! # Agent
//!
//! Glue between the render loop and the external driving agent: forwards the
//! world snapshot, decides when to reroute or stop, and returns the control
//! to apply. Planning itself belongs to the agent.

pub mod adapter;
pub mod policy;

pub use adapter::{AgentAdapter, AgentStep, MISSION_ACCOMPLISHED, TARGET_NOTIFICATION_SECONDS};
pub use policy::{RouteDecision, RoutePolicy, DEFAULT_MIN_WAYPOINTS};
