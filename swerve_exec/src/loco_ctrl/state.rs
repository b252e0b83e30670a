//! Implementations for the SwerveKinematics structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{DMatrix, DVector};

// Internal
use super::{ChassisVel, LocoCtrlError, Params, WheelState, NUM_MODULES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Determinants of the normal matrix below this value are treated as singular.
const SINGULAR_DET_LIMIT: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Maps between chassis velocity and individual swerve module demands.
///
/// The forward mapping is a pure function of the module geometry. The inverse
/// mapping is a least squares fit using a pseudo-inverse computed once at
/// construction.
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    params: Params,

    /// Pseudo-inverse of the kinematics matrix, 3 x (2 * NUM_MODULES).
    inverse: DMatrix<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    /// Create a new kinematics mapper from the given parameters.
    pub fn new(params: Params) -> Result<Self, LocoCtrlError> {
        if !(params.max_wheel_speed_ms.is_finite() && params.max_wheel_speed_ms > 0.0) {
            return Err(LocoCtrlError::InvalidMaxWheelSpeed(params.max_wheel_speed_ms));
        }

        // Each module contributes two rows, mapping (vx, vy, omega) onto the
        // module's velocity components.
        let forward = DMatrix::from_fn(2 * NUM_MODULES, 3, |r, c| {
            let pos = params.module_pos_m_rb[r / 2];
            match (r % 2, c) {
                (0, 0) => 1.0,
                (0, 2) => -pos[1],
                (1, 1) => 1.0,
                (1, 2) => pos[0],
                _ => 0.0,
            }
        });

        let forward_t = forward.transpose();
        let normal = &forward_t * &forward;

        if normal.determinant().abs() < SINGULAR_DET_LIMIT {
            return Err(LocoCtrlError::InvalidGeometry);
        }

        let inverse = match normal.try_inverse() {
            Some(n) => n * forward_t,
            None => return Err(LocoCtrlError::InvalidGeometry),
        };

        Ok(Self { params, inverse })
    }

    /// Compute the demand for each module required to achieve the given
    /// body frame chassis velocity.
    ///
    /// A module with zero velocity is given a zero steer angle.
    pub fn to_wheel_states(&self, vel: &ChassisVel) -> [WheelState; NUM_MODULES] {
        let mut states = [WheelState::default(); NUM_MODULES];

        for (state, pos) in states.iter_mut().zip(self.params.module_pos_m_rb.iter()) {
            let vx = vel.vx_ms - vel.omega_rads * pos[1];
            let vy = vel.vy_ms + vel.omega_rads * pos[0];

            state.speed_ms = vx.hypot(vy);
            state.angle_rad = vy.atan2(vx);
        }

        trace!("Wheel states for {:?}: {:?}", vel, states);

        states
    }

    /// Scale all wheel speeds by a common factor so that none exceeds the
    /// maximum wheel speed.
    ///
    /// Returns `true` if the speeds were limited.
    pub fn desaturate(&self, states: &mut [WheelState]) -> bool {
        desaturate(states, self.params.max_wheel_speed_ms)
    }

    /// Estimate the chassis velocity which best matches the given module
    /// states in a least squares sense.
    pub fn to_chassis_vel(&self, states: &[WheelState; NUM_MODULES]) -> ChassisVel {
        let module_vels = DVector::from_fn(2 * NUM_MODULES, |r, _| {
            let state = &states[r / 2];
            match r % 2 {
                0 => state.speed_ms * state.angle_rad.cos(),
                _ => state.speed_ms * state.angle_rad.sin(),
            }
        });

        let chassis = &self.inverse * module_vels;

        ChassisVel::new(chassis[0], chassis[1], chassis[2])
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Scale all wheel speeds by a common factor so that none exceeds
/// `max_speed_ms`, preserving the ratio between wheels.
///
/// Returns `true` if the speeds were limited.
pub fn desaturate(states: &mut [WheelState], max_speed_ms: f64) -> bool {
    let peak = states
        .iter()
        .fold(0f64, |peak, s| peak.max(s.speed_ms.abs()));

    if peak <= max_speed_ms {
        return false;
    }

    let scale = max_speed_ms / peak;
    for state in states.iter_mut() {
        state.speed_ms *= scale;
    }

    true
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn params() -> Params {
        Params {
            module_pos_m_rb: [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]],
            max_wheel_speed_ms: 4.0,
        }
    }

    #[test]
    fn test_zero_velocity() {
        let kin = SwerveKinematics::new(params()).unwrap();

        for s in kin.to_wheel_states(&ChassisVel::default()).iter() {
            assert_eq!(s.speed_ms, 0.0);
            assert_eq!(s.angle_rad, 0.0);
        }
    }

    #[test]
    fn test_translation() {
        let kin = SwerveKinematics::new(params()).unwrap();

        let states = kin.to_wheel_states(&ChassisVel::new(0.0, 2.0, 0.0));
        for s in states.iter() {
            assert!((s.speed_ms - 2.0).abs() < 1e-12);
            assert!((s.angle_rad - FRAC_PI_2).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rotation() {
        let kin = SwerveKinematics::new(params()).unwrap();

        let states = kin.to_wheel_states(&ChassisVel::new(0.0, 0.0, 1.0));
        let radius = 0.3f64.hypot(0.3);

        for s in states.iter() {
            assert!((s.speed_ms - radius).abs() < 1e-12);
        }

        // Front left module moves backwards and left, rear right forwards and
        // right.
        assert!((states[0].angle_rad - 3.0 * FRAC_PI_4).abs() < 1e-12);
        assert!((states[3].angle_rad + FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_inverse() {
        let kin = SwerveKinematics::new(params()).unwrap();

        let vel = ChassisVel::new(1.2, -0.4, 0.7);
        let est = kin.to_chassis_vel(&kin.to_wheel_states(&vel));

        assert!((est.vx_ms - vel.vx_ms).abs() < 1e-9);
        assert!((est.vy_ms - vel.vy_ms).abs() < 1e-9);
        assert!((est.omega_rads - vel.omega_rads).abs() < 1e-9);
    }

    #[test]
    fn test_desaturate() {
        let kin = SwerveKinematics::new(params()).unwrap();

        let mut states = [
            WheelState::new(8.0, 0.0),
            WheelState::new(2.0, 0.0),
            WheelState::new(-4.0, 0.0),
            WheelState::new(1.0, 0.0),
        ];

        assert!(kin.desaturate(&mut states));
        assert!((states[0].speed_ms - 4.0).abs() < 1e-12);
        assert!((states[1].speed_ms - 1.0).abs() < 1e-12);
        assert!((states[2].speed_ms + 2.0).abs() < 1e-12);
        assert!((states[3].speed_ms - 0.5).abs() < 1e-12);

        // Already within limits
        assert!(!kin.desaturate(&mut states));
        assert!((states[0].speed_ms - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_params() {
        let mut p = params();
        p.module_pos_m_rb = [[0.0, 0.0]; NUM_MODULES];
        assert!(matches!(
            SwerveKinematics::new(p),
            Err(LocoCtrlError::InvalidGeometry)
        ));

        let mut p = params();
        p.max_wheel_speed_ms = 0.0;
        assert!(matches!(
            SwerveKinematics::new(p),
            Err(LocoCtrlError::InvalidMaxWheelSpeed(_))
        ));
    }
}
