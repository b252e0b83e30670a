//! Waypoint control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::{loc::Pose, traj_gen::TrajConfig};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for waypoint control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// The target pose before any offset is applied.
    ///
    /// Frame: Field
    pub goal_pose: Pose,

    /// Magnitude of the lateral goal offset.
    ///
    /// Units: meters
    pub y_offset_m: f64,

    /// Constraints on generated trajectories.
    pub traj: TrajConfig,
}
