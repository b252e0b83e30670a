//! # Trajectory generation module
//!
//! Generates time parameterised straight line trajectories between two poses
//! subject to velocity and acceleration limits, and samples them in time.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod generator;
mod params;
mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use generator::*;
pub use params::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur during trajectory generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajGenError {
    #[error("No trajectory satisfies the constraints: {0}")]
    InfeasiblePath(InfeasibleCause),
}

/// The reason a path could not be parameterised.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InfeasibleCause {
    #[error("invalid limits (max velocity {max_vel_ms} m/s, max acceleration {max_accel_mss} m/s^2)")]
    InvalidLimits { max_vel_ms: f64, max_accel_mss: f64 },

    #[error("invalid sample period {0} s")]
    InvalidSamplePeriod(f64),

    #[error("{which} velocity {vel_ms} m/s is negative or not finite")]
    InvalidVelocity { which: &'static str, vel_ms: f64 },

    #[error("{which} velocity {vel_ms} m/s exceeds the maximum of {max_vel_ms} m/s")]
    VelocityAboveMax {
        which: &'static str,
        vel_ms: f64,
        max_vel_ms: f64,
    },

    #[error(
        "{dist_m} m is too short to change speed from {start_vel_ms} m/s to {end_vel_ms} m/s \
        ({required_m} m required)"
    )]
    TooShort {
        dist_m: f64,
        required_m: f64,
        start_vel_ms: f64,
        end_vel_ms: f64,
    },

    #[error("start and goal poses are not finite")]
    NonFinitePose,
}
