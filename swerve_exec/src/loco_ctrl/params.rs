//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// The position of the steer axis of each module in the robot body frame,
    /// ordered front-left, front-right, rear-left, rear-right.
    ///
    /// Units: meters,
    /// Frame: Robot body (+X forwards, +Y left)
    pub module_pos_m_rb: [[f64; 2]; NUM_MODULES],

    // ---- CAPABILITIES ----

    /// Maximum achievable wheel ground speed.
    ///
    /// Units: meters/second
    pub max_wheel_speed_ms: f64,
}
