//! Control Command types
//!
//! Produced once per render-loop iteration and applied to the controlled
//! actor. No history is kept.

use serde::{Deserialize, Serialize};

use crate::Vector3;

/// Vehicle control command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    /// Throttle in [0, 1]
    pub throttle: f64,
    /// Steer in [-1, 1]
    pub steer: f64,
    /// Brake in [0, 1]
    pub brake: f64,
    pub hand_brake: bool,
    pub reverse: bool,
    pub manual_gear_shift: bool,
    /// Current gear: -1 reverse, 0 neutral, >0 forward gears
    pub gear: i32,
}

impl Default for VehicleControl {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            steer: 0.0,
            brake: 0.0,
            hand_brake: false,
            reverse: false,
            manual_gear_shift: false,
            gear: 1,
        }
    }
}

impl VehicleControl {
    /// Label shown on the HUD for the current gear
    pub fn gear_label(&self) -> String {
        match self.gear {
            -1 => "R".to_string(),
            0 => "N".to_string(),
            g => g.to_string(),
        }
    }

    /// Clamp every axis into its legal range
    pub fn clamped(mut self) -> Self {
        self.throttle = self.throttle.clamp(0.0, 1.0);
        self.brake = self.brake.clamp(0.0, 1.0);
        self.steer = self.steer.clamp(-1.0, 1.0);
        self
    }
}

/// Pedestrian control command
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkerControl {
    pub direction: Vector3,
    /// Speed in m/s
    pub speed: f64,
    pub jump: bool,
}

/// Walker speed gauge upper bound in m/s
pub const WALKER_MAX_SPEED: f64 = 5.556;

/// Control of whichever actor kind the player is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorControl {
    Vehicle(VehicleControl),
    Walker(WalkerControl),
}

impl Default for ActorControl {
    fn default() -> Self {
        Self::Vehicle(VehicleControl::default())
    }
}
