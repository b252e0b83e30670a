//! # Trajectory control module
//!
//! Trajectory control keeps the vehicle on the desired trajectory. It does
//! this with three controllers working in the field frame:
//!
//! - Two PID controllers acting on the x and y position errors between the
//!   measured pose and the desired trajectory state. Their outputs are added
//!   to the feedforward velocity of the trajectory.
//! - A profiled PID controller acting on heading. Rather than chasing the
//!   target heading directly, a trapezoidal profile moves an intermediate
//!   setpoint towards the target each cycle, keeping the angular rate and
//!   acceleration bounded.
//!
//! The combined field frame demand is rotated into the robot frame using the
//! measured heading before being passed to the kinematics.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod holonomic;
pub mod params;
pub mod profile;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use holonomic::*;
pub use params::*;
pub use profile::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building the trajectory controllers from parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("The control period must be positive and finite, found {0} s")]
    InvalidPeriod(f64),

    #[error("The gains of the {0} controller must be finite")]
    InvalidGains(&'static str),

    #[error("Invalid integrator range [{min}, {max}] for the {axis} controller")]
    InvalidIntegratorRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Invalid tolerance {tolerance} for the {axis} controller")]
    InvalidTolerance { axis: &'static str, tolerance: f64 },

    #[error(
        "Heading profile limits must be positive and finite, found {max_vel_rads} rad/s and \
        {max_accel_radss} rad/s^2"
    )]
    InvalidProfileLimits {
        max_vel_rads: f64,
        max_accel_radss: f64,
    },
}
