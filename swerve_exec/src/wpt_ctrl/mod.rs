//! # Waypoint control module
//!
//! Waypoint control drives the vehicle to a target pose. On start a trajectory
//! is generated from the current pose to the goal, which is then tracked each
//! cycle by the holonomic controller.
//!
//! The goal can be offset laterally (left, center or right) while the
//! trajectory is being tracked. When the selected offset changes a new
//! trajectory is generated from the current pose, seeded with the velocity the
//! vehicle should currently have, so that the vehicle does not need to stop
//! before heading for the new goal.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    loc::Pose,
    loco_ctrl::{ChassisVel, LocoCtrlError, WheelState, NUM_MODULES},
    traj_ctrl::{TrackingErrors, TrajCtrlError},
    traj_gen::{InfeasibleCause, Trajectory, TrajectoryState},
};
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Provides the current field relative pose of the vehicle.
pub trait PoseSource {
    fn get_pose(&self) -> Pose;
}

/// Provides a correction to the target heading based on the measured rotation
/// rate, already weighted.
///
/// Units: radians/second
pub trait Gyro {
    fn get_rate_correction(&self) -> f64;
}

/// Provides the currently selected goal offset. Polled once per cycle.
pub trait GoalOffsetSource {
    fn get_offset(&self) -> GoalOffset;
}

/// Accepts the demanded state of each swerve module.
pub trait WheelStateSink {
    fn apply_wheel_states(&mut self, states: &[WheelState; NUM_MODULES]);
}

/// Observes the processing of waypoint control, for example for telemetry or
/// archiving.
pub trait TickObserver {
    /// Called at the end of each cycle in which wheel states were emitted.
    fn on_tick(&mut self, _snapshot: &TickSnapshot) {}

    /// Called each time a new trajectory is generated.
    fn on_trajectory(&mut self, _trajectory: &Trajectory) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The external components waypoint control reads from and writes to.
pub struct Collaborators {
    pub pose_source: Box<dyn PoseSource>,
    pub gyro: Box<dyn Gyro>,
    pub offset_source: Box<dyn GoalOffsetSource>,
    pub sink: Box<dyn WheelStateSink>,
    pub observer: Option<Box<dyn TickObserver>>,
}

/// Values from a single tracking cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickSnapshot {
    /// Time since the start of the active trajectory.
    ///
    /// Units: seconds
    pub elapsed_s: f64,

    pub measured_pose: Pose,

    /// The sampled trajectory state being tracked.
    pub desired: TrajectoryState,

    /// The heading the vehicle is being turned to face.
    ///
    /// Units: radians
    pub desired_heading_rad: f64,

    pub errors: TrackingErrors,

    /// Robot relative chassis velocity demand.
    pub chassis_vel: ChassisVel,

    pub wheel_states: [WheelState; NUM_MODULES],
}

/// Observer which writes each tick to the log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Lateral offset applied to the goal pose, in the goal's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalOffset {
    Left,
    Center,
    Right,
}

/// Errors raised when constructing waypoint control.
#[derive(Debug, thiserror::Error)]
pub enum WptCtrlError {
    #[error("Invalid trajectory configuration: {0}")]
    InvalidTrajConfig(InfeasibleCause),

    #[error("The goal offset must be finite, found {0} m")]
    InvalidOffset(f64),

    #[error("The goal pose must be finite, found {0}")]
    InvalidGoal(Pose),

    #[error("Invalid trajectory controller parameters: {0}")]
    TrajCtrl(#[from] TrajCtrlError),

    #[error("Invalid locomotion parameters: {0}")]
    LocoCtrl(#[from] LocoCtrlError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoalOffset {
    /// Lateral displacement of this offset for the given offset magnitude.
    ///
    /// Units: meters, positive to the goal's left
    pub fn lateral_m(&self, y_offset_m: f64) -> f64 {
        match self {
            GoalOffset::Left => -y_offset_m,
            GoalOffset::Center => 0.0,
            GoalOffset::Right => y_offset_m,
        }
    }

    /// Apply this offset to the goal pose.
    pub fn apply(&self, goal: &Pose, y_offset_m: f64) -> Pose {
        goal.transform_by(0.0, self.lateral_m(y_offset_m))
    }
}

impl Default for GoalOffset {
    fn default() -> Self {
        GoalOffset::Center
    }
}

impl TickObserver for LogObserver {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        debug!(
            "t = {:.3} s, pose {}, desired {} at {:.3} m/s, errors ({:.4} m, {:.4} m, {:.4} rad)",
            snapshot.elapsed_s,
            snapshot.measured_pose,
            snapshot.desired.pose,
            snapshot.desired.vel_ms,
            snapshot.errors.x_error_m,
            snapshot.errors.y_error_m,
            snapshot.errors.head_error_rad
        );
    }

    fn on_trajectory(&mut self, trajectory: &Trajectory) {
        debug!(
            "New trajectory: {} -> {} over {:.3} s ({} states)",
            trajectory.start().pose,
            trajectory.end().pose,
            trajectory.duration_s(),
            trajectory.states().len()
        );
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
