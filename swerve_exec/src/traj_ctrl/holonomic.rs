//! Holonomic trajectory tracking controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::f64::consts::PI;

// Internal
use super::{Params, PidController, ProfiledPidController, TrajCtrlError};
use crate::loc::Pose;
use crate::loco_ctrl::ChassisVel;
use crate::traj_gen::TrajectoryState;
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller combining position feedback on each field axis with a profiled
/// heading controller, driving a holonomic chassis along a trajectory.
#[derive(Debug, Clone)]
pub struct HolonomicController {
    x_ctrl: PidController,
    y_ctrl: PidController,
    theta_ctrl: ProfiledPidController,

    errors: TrackingErrors,
}

/// Errors between the measured pose and the reference from the last call to
/// `HolonomicController::calculate`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct TrackingErrors {
    /// Field X position error (desired - measured)
    ///
    /// Units: meters
    pub x_error_m: f64,

    /// Field Y position error (desired - measured)
    ///
    /// Units: meters
    pub y_error_m: f64,

    /// Heading error (target - measured), wrapped to (-pi, pi]
    ///
    /// Units: radians
    pub head_error_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HolonomicController {
    /// Create a new instance of the controllers from the parameters
    pub fn new(params: &Params) -> Result<Self, TrajCtrlError> {
        params.validate()?;

        let mut theta_ctrl = ProfiledPidController::new(&params.theta_ctrl, params.period_s);
        theta_ctrl.enable_continuous_input(-PI, PI);

        Ok(Self {
            x_ctrl: PidController::new(&params.x_ctrl, params.period_s),
            y_ctrl: PidController::new(&params.y_ctrl, params.period_s),
            theta_ctrl,
            errors: TrackingErrors::default(),
        })
    }

    /// Calculate the robot relative chassis velocity needed to track the
    /// desired state.
    ///
    /// # Inputs
    /// - `measured`: the current field relative pose of the robot
    /// - `desired`: the trajectory state to track
    /// - `desired_heading_rad`: the heading the robot should face, which is
    ///   independent of the direction of travel
    /// - `rate_correction_rads`: gyro based correction subtracted from the
    ///   desired heading
    pub fn calculate(
        &mut self,
        measured: &Pose,
        desired: &TrajectoryState,
        desired_heading_rad: f64,
        rate_correction_rads: f64,
    ) -> ChassisVel {
        // Feedforward along the path tangent
        let ref_heading_rad = desired.pose.heading_rad;
        let ff_x_ms = desired.vel_ms * ref_heading_rad.cos();
        let ff_y_ms = desired.vel_ms * ref_heading_rad.sin();

        let fb_x_ms = self.x_ctrl.calculate(measured.x(), desired.pose.x());
        let fb_y_ms = self.y_ctrl.calculate(measured.y(), desired.pose.y());

        let target_heading_rad = desired_heading_rad - rate_correction_rads;
        let omega_rads = self
            .theta_ctrl
            .calculate(measured.heading_rad, target_heading_rad);

        self.errors = TrackingErrors {
            x_error_m: self.x_ctrl.error(),
            y_error_m: self.y_ctrl.error(),
            head_error_rad: wrap_pi(target_heading_rad - measured.heading_rad),
        };

        trace!(
            "HolonomicController: ff ({:.4}, {:.4}), fb ({:.4}, {:.4}, {:.4}), errors {:?}",
            ff_x_ms,
            ff_y_ms,
            fb_x_ms,
            fb_y_ms,
            omega_rads,
            self.errors
        );

        ChassisVel::from_field_relative(
            ff_x_ms + fb_x_ms,
            ff_y_ms + fb_y_ms,
            omega_rads,
            measured.heading_rad,
        )
    }

    /// Clear the integrators and history of all controllers.
    pub fn reset(&mut self) {
        self.x_ctrl.reset();
        self.y_ctrl.reset();
        self.theta_ctrl.reset();
        self.errors = TrackingErrors::default();
    }

    /// Errors from the most recent call to `calculate`.
    pub fn errors(&self) -> TrackingErrors {
        self.errors
    }

    /// Returns `true` if all axes were within tolerance on the most recent
    /// call to `calculate`.
    pub fn at_reference(&self) -> bool {
        self.x_ctrl.at_setpoint()
            && self.y_ctrl.at_setpoint()
            && self.errors.head_error_rad.abs() < self.theta_ctrl.tolerance()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_ctrl::{PidParams, ProfiledPidParams};
    use std::f64::consts::FRAC_PI_2;

    fn params() -> Params {
        let mut x_ctrl = PidParams::new(1.0, 0.0, 0.0);
        x_ctrl.integrator_range = [-0.3, 0.3];
        let mut y_ctrl = PidParams::new(0.7, 0.0, 0.0);
        y_ctrl.integrator_range = [-0.3, 0.3];
        let mut theta = PidParams::new(1.3, 0.0, 0.0);
        theta.tolerance = PI / 180.0;

        Params {
            period_s: 0.02,
            x_ctrl,
            y_ctrl,
            theta_ctrl: ProfiledPidParams {
                pid: theta,
                max_vel_rads: 6.0,
                max_accel_radss: 12.0,
            },
        }
    }

    fn state(x: f64, y: f64, heading_rad: f64, vel_ms: f64) -> TrajectoryState {
        TrajectoryState {
            time_s: 0.0,
            pose: Pose::new(x, y, heading_rad),
            vel_ms,
            accel_mss: 0.0,
            curvature_radm: 0.0,
        }
    }

    #[test]
    fn test_zero_error() {
        let mut ctrl = HolonomicController::new(&params()).unwrap();
        let pose = Pose::new(1.0, 2.0, 0.3);

        for _ in 0..5 {
            let out = ctrl.calculate(&pose, &state(1.0, 2.0, 0.0, 0.0), 0.3, 0.0);
            assert_eq!(out.vx_ms, 0.0);
            assert_eq!(out.vy_ms, 0.0);
            assert_eq!(out.omega_rads, 0.0);
        }
        assert!(ctrl.at_reference());
    }

    #[test]
    fn test_feedforward() {
        let mut ctrl = HolonomicController::new(&params()).unwrap();

        // Travelling along field +Y while facing field +Y, so the robot
        // should drive forwards.
        let pose = Pose::new(0.0, 0.0, FRAC_PI_2);
        let out = ctrl.calculate(&pose, &state(0.0, 0.0, FRAC_PI_2, 2.0), FRAC_PI_2, 0.0);

        assert!((out.vx_ms - 2.0).abs() < 1e-9);
        assert!(out.vy_ms.abs() < 1e-9);
        assert!(out.omega_rads.abs() < 1e-9);
    }

    #[test]
    fn test_position_feedback() {
        let mut ctrl = HolonomicController::new(&params()).unwrap();

        // Robot is 0.5 m to the right of the reference (field -Y) facing +X
        let pose = Pose::new(0.0, -0.5, 0.0);
        let out = ctrl.calculate(&pose, &state(0.0, 0.0, 0.0, 0.0), 0.0, 0.0);

        assert!(out.vx_ms.abs() < 1e-12);
        assert!((out.vy_ms - 0.35).abs() < 1e-12);
        assert!((ctrl.errors().y_error_m - 0.5).abs() < 1e-12);
        assert!(!ctrl.at_reference());
    }

    #[test]
    fn test_rate_correction() {
        let mut ctrl = HolonomicController::new(&params()).unwrap();
        let pose = Pose::new(0.0, 0.0, 0.0);

        // Positive rate correction lowers the target heading
        let out = ctrl.calculate(&pose, &state(0.0, 0.0, 0.0, 0.0), 0.0, 0.1);
        assert!(out.omega_rads < 0.0);
        assert!((ctrl.errors().head_error_rad + 0.1).abs() < 1e-12);

        ctrl.reset();
        assert_eq!(ctrl.errors(), TrackingErrors::default());
    }

    #[test]
    fn test_invalid_params() {
        let mut p = params();
        p.theta_ctrl.max_vel_rads = -1.0;
        assert!(HolonomicController::new(&p).is_err());
    }
}
