//! Commands passed into LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity of the chassis, expressed in the robot body frame.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChassisVel {
    /// Velocity along the body +X (forwards) axis.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Velocity along the body +Y (left) axis.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Rotation rate about +Z, positive anticlockwise.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// Demand for a single swerve module.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelState {
    /// Ground speed of the wheel.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steer angle of the module relative to the body +X axis.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisVel {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads }
    }

    /// Convert a velocity expressed in the field frame into the body frame of
    /// a robot with the given heading.
    pub fn from_field_relative(
        vx_ms: f64,
        vy_ms: f64,
        omega_rads: f64,
        heading_rad: f64,
    ) -> Self {
        // Rotate by -heading
        let (sin, cos) = heading_rad.sin_cos();

        Self {
            vx_ms: vx_ms * cos + vy_ms * sin,
            vy_ms: -vx_ms * sin + vy_ms * cos,
            omega_rads,
        }
    }

    /// Convert this body frame velocity into the field frame.
    pub fn to_field_relative(&self, heading_rad: f64) -> Self {
        let (sin, cos) = heading_rad.sin_cos();

        Self {
            vx_ms: self.vx_ms * cos - self.vy_ms * sin,
            vy_ms: self.vx_ms * sin + self.vy_ms * cos,
            omega_rads: self.omega_rads,
        }
    }
}

impl WheelState {
    pub fn new(speed_ms: f64, angle_rad: f64) -> Self {
        Self { speed_ms, angle_rad }
    }
}
