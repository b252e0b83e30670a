//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::{loc::Pose, wpt_ctrl::GoalOffset};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated robot
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Pose of the robot at the start of the simulation.
    ///
    /// Frame: Field
    pub start_pose: Pose,

    /// Weighting applied to the measured rotation rate to give the heading
    /// correction.
    pub gyro_correction_gain: f64,

    /// Constant rotation added to the chassis motion, simulating drift.
    ///
    /// Units: radians/second
    #[serde(default)]
    pub heading_drift_rads: f64,

    /// Total simulated time to run for.
    ///
    /// Units: seconds
    pub run_duration_s: f64,

    /// If `true` the simulation is paced to real time.
    #[serde(default)]
    pub realtime: bool,

    /// Goal offset selections to apply during the run, in time order.
    #[serde(default)]
    pub offset_script: Vec<OffsetEvent>,
}

/// A change of the selected goal offset at a given simulation time.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OffsetEvent {
    /// Units: seconds
    pub time_s: f64,

    pub offset: GoalOffset,
}
