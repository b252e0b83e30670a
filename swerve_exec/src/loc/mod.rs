//! # Localisation module
//!
//! This module defines the pose of the vehicle on the field. Localisation 
//! itself (odometry, vision) is provided externally through the
//! [`crate::wpt_ctrl::PoseSource`] interface.
//!
//! Field frame: X along the length of the field, Y to the left, headings 
//! measured anticlockwise from +X (right hand rule about +Z, upwards).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose (position and heading in the field frame) of the vehicle.
///
/// The heading is always wrapped into (-pi, pi].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPose")]
pub struct Pose {
    /// The position in the field frame
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// The heading, angle to the field +X axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Unvalidated pose as it appears in parameter files.
#[derive(Deserialize)]
struct RawPose {
    position_m: [f64; 2],
    heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Create a new pose, wrapping the heading into (-pi, pi].
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: wrap_pi(heading_rad),
        }
    }

    /// Create a pose at the given position with the given heading.
    pub fn from_position(position_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self::new(position_m.x, position_m.y, heading_rad)
    }

    pub fn x(&self) -> f64 {
        self.position_m.x
    }

    pub fn y(&self) -> f64 {
        self.position_m.y
    }

    /// Apply a translation expressed in this pose's own frame, keeping the
    /// heading.
    ///
    /// For example `transform_by(0.0, 0.5)` moves the pose half a meter to its
    /// own left.
    pub fn transform_by(&self, dx_m: f64, dy_m: f64) -> Self {
        let (sin, cos) = self.heading_rad.sin_cos();

        Self {
            position_m: self.position_m
                + Vector2::new(dx_m * cos - dy_m * sin, dx_m * sin + dy_m * cos),
            heading_rad: self.heading_rad,
        }
    }

    /// Straight line distance to another pose.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (other.position_m - self.position_m).norm()
    }

    /// Bearing (angle to the field +X axis) of the line from this pose to the
    /// other.
    ///
    /// If the poses are coincident the bearing is undefined and 0 is returned.
    pub fn bearing_to(&self, other: &Pose) -> f64 {
        let diff = other.position_m - self.position_m;
        diff.y.atan2(diff.x)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl From<RawPose> for Pose {
    fn from(raw: RawPose) -> Self {
        Self::new(raw.position_m[0], raw.position_m[1], raw.heading_rad)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.3} m, y: {:.3} m, θ: {:.3} rad)",
            self.position_m.x, self.position_m.y, self.heading_rad
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
