//! Locomotion control module
//!
//! Converts chassis velocity demands into individual swerve module demands
//! (wheel speed and steer angle).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the vehicle.
///
/// Modules are always ordered front-left, front-right, rear-left, rear-right.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl construction.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("The module geometry does not allow chassis motion to be recovered from module states")]
    InvalidGeometry,

    #[error("The maximum wheel speed must be positive and finite, found {0}")]
    InvalidMaxWheelSpeed(f64),
}
