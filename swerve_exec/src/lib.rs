//! # Swerve library.
//!
//! This library allows other crates in the workspace to access items defined inside the swerve
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation module - the pose of the vehicle in the field
pub mod loc;

/// Locomotion control module - converts chassis velocity demands into individual module demands
pub mod loco_ctrl;

/// Simulation module - a simulated swerve chassis for ground testing
pub mod sim;

/// Trajectory control module - keeps the vehicle on the given trajectory
pub mod traj_ctrl;

/// Trajectory generation module - builds time parameterised trajectories between poses
pub mod traj_gen;

/// Waypoint control module - drives the vehicle to a goal pose, replanning as the goal changes
pub mod wpt_ctrl;
