//! DrivingAgent trait - external decision object boundary
//!
//! Path planning and driving decisions are owned by the navigation library;
//! the HUD client only feeds it world state and applies what it returns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Location, Transform, VehicleControl, WorldSnapshot};

/// External decision object driving the player vehicle
pub trait DrivingAgent: Send {
    /// Refresh the agent's view of the world before deciding
    fn update_information(&mut self, world: &WorldSnapshot);

    /// Compute the control for this step
    fn run_step(&mut self) -> VehicleControl;

    /// Waypoints left in the current route, `None` if the agent has no route
    fn remaining_waypoints(&self) -> Option<usize>;

    /// Drop the current route and plan a new one to `destination`
    fn set_destination(&mut self, destination: Location);

    /// Extend the route from its current end towards a destination picked
    /// from `spawn_points`
    fn reroute(&mut self, spawn_points: &[Transform]);

    /// Target speed in km/h
    fn set_target_speed(&mut self, speed_kmh: f64);
}

/// Which navigation agent drives the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    #[default]
    Behavior,
    Roaming,
    Basic,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behavior => "Behavior",
            Self::Roaming => "Roaming",
            Self::Basic => "Basic",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Behavior" => Ok(Self::Behavior),
            "Roaming" => Ok(Self::Roaming),
            "Basic" => Ok(Self::Basic),
            other => Err(format!(
                "invalid agent '{other}' (expected Behavior, Roaming or Basic)"
            )),
        }
    }
}

/// Driving style of the behavior agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Cautious,
    #[default]
    Normal,
    Aggressive,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::Normal => "normal",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cautious" => Ok(Self::Cautious),
            "normal" => Ok(Self::Normal),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!(
                "invalid behavior '{other}' (expected cautious, normal or aggressive)"
            )),
        }
    }
}
