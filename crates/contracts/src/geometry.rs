//! Geometry primitives mirrored from the simulator's coordinate system
//!
//! Units: meters for locations, degrees for rotations.

use serde::{Deserialize, Serialize};

/// 3D vector (velocity, impulse, acceleration)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm `sqrt(x² + y² + z²)`
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    pub const fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Unit vector pointing along the yaw of this transform (pitch ignored)
    pub fn forward_vector(&self) -> Vector3 {
        let yaw = self.rotation.yaw.to_radians();
        Vector3::new(yaw.cos(), yaw.sin(), 0.0)
    }
}
