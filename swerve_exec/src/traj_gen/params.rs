//! Trajectory generation configuration

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::InfeasibleCause;

/// Tolerance used when comparing velocities and distances against limits.
pub(super) const LIMIT_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Constraints and settings used when generating a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajConfig {
    /// Maximum velocity along the path.
    ///
    /// Units: meters/second
    pub max_vel_ms: f64,

    /// Maximum magnitude of acceleration along the path.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Velocity at the end of the trajectory.
    ///
    /// Units: meters/second
    #[serde(default)]
    pub end_vel_ms: f64,

    /// Time between generated trajectory states.
    ///
    /// Units: seconds
    #[serde(default = "default_sample_period_s")]
    pub sample_period_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajConfig {
    pub fn new(max_vel_ms: f64, max_accel_mss: f64) -> Self {
        Self {
            max_vel_ms,
            max_accel_mss,
            end_vel_ms: 0.0,
            sample_period_s: default_sample_period_s(),
        }
    }

    /// Check that the limits describe a usable configuration.
    pub fn validate(&self) -> Result<(), InfeasibleCause> {
        if !(self.max_vel_ms.is_finite()
            && self.max_vel_ms > 0.0
            && self.max_accel_mss.is_finite()
            && self.max_accel_mss > 0.0)
        {
            return Err(InfeasibleCause::InvalidLimits {
                max_vel_ms: self.max_vel_ms,
                max_accel_mss: self.max_accel_mss,
            });
        }

        if !(self.sample_period_s.is_finite() && self.sample_period_s > 0.0) {
            return Err(InfeasibleCause::InvalidSamplePeriod(self.sample_period_s));
        }

        check_velocity("end", self.end_vel_ms, self.max_vel_ms)
    }
}

/// Check that a velocity along the path is non-negative and within the
/// maximum.
pub(super) fn check_velocity(
    which: &'static str,
    vel_ms: f64,
    max_vel_ms: f64,
) -> Result<(), InfeasibleCause> {
    if !(vel_ms.is_finite() && vel_ms >= 0.0) {
        return Err(InfeasibleCause::InvalidVelocity { which, vel_ms });
    }
    if vel_ms > max_vel_ms + LIMIT_EPSILON {
        return Err(InfeasibleCause::VelocityAboveMax {
            which,
            vel_ms,
            max_vel_ms,
        });
    }

    Ok(())
}

fn default_sample_period_s() -> f64 {
    0.02
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
