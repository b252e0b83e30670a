//! # Simulation module
//!
//! A simulated swerve chassis which stands in for the real drive, gyro and
//! localisation when running waypoint control on the ground. The simulated
//! robot executes the demanded wheel states perfectly, integrates its pose
//! from the resulting chassis motion, and plays back a scripted sequence of
//! goal offset selections.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod robot;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use robot::*;
