//! # Trajectory controllers module
//!
//! This module provides the PID controllers used by trajectory control,
//! including the profiled controller used for heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{Constraints, PidParams, ProfileState, ProfiledPidParams, TrapezoidProfile};
use util::maths::{clamp, input_modulus};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Minimum and maximum contribution of the integral term
    integrator_range: [f64; 2],

    /// Error within which the controller is at its setpoint
    tolerance: f64,

    /// Fixed time between calls to `calculate`
    period_s: f64,

    /// Range over which the input wraps, if continuous
    continuous_range: Option<(f64, f64)>,

    /// Previous error, `None` until the first call after a reset
    prev_error: Option<f64>,

    /// The most recent error
    error: f64,

    /// The integral accumulation
    integral: f64,
}

/// A PID controller whose setpoint follows a trapezoidal profile towards the
/// goal.
#[derive(Debug, Clone)]
pub struct ProfiledPidController {
    pid: PidController,

    profile: TrapezoidProfile,

    /// Current profile setpoint, `None` until seeded by a measurement
    setpoint: Option<ProfileState>,

    /// Most recent goal
    goal: ProfileState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(params: &PidParams, period_s: f64) -> Self {
        Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            integrator_range: params.integrator_range,
            tolerance: params.tolerance,
            period_s,
            continuous_range: None,
            prev_error: None,
            error: 0.0,
            integral: 0.0,
        }
    }

    /// Treat the input as wrapping between `min` and `max`, so the error is
    /// always the shortest distance around the range.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous_range = Some((min, max));
    }

    /// Get the output of the controller for the given measurement and
    /// setpoint.
    pub fn calculate(&mut self, measurement: f64, setpoint: f64) -> f64 {
        self.error = match self.continuous_range {
            Some((min, max)) => {
                let bound = (max - min) / 2.0;
                input_modulus(setpoint - measurement, -bound, bound)
            }
            None => setpoint - measurement,
        };

        // The integral is held so that its contribution to the output stays
        // within the integrator range.
        if self.k_i != 0.0 {
            self.integral = clamp(
                &(self.integral + self.error * self.period_s),
                &(self.integrator_range[0] / self.k_i),
                &(self.integrator_range[1] / self.k_i),
            );
        }

        // No derivative on the first call, there's no history to take it from
        let deriv = match self.prev_error {
            Some(e) => (self.error - e) / self.period_s,
            None => 0.0,
        };

        self.prev_error = Some(self.error);

        self.k_p * self.error + self.k_i * self.integral + self.k_d * deriv
    }

    /// Clear the integral and error history.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.error = 0.0;
        self.integral = 0.0;
    }

    /// The error from the most recent call to `calculate`.
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Returns `true` if the most recent error was within tolerance.
    pub fn at_setpoint(&self) -> bool {
        self.prev_error.is_some() && self.error.abs() < self.tolerance
    }
}

impl ProfiledPidController {
    pub fn new(params: &ProfiledPidParams, period_s: f64) -> Self {
        Self {
            pid: PidController::new(&params.pid, period_s),
            profile: TrapezoidProfile::new(Constraints {
                max_vel: params.max_vel_rads,
                max_accel: params.max_accel_radss,
            }),
            setpoint: None,
            goal: ProfileState::default(),
        }
    }

    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.pid.enable_continuous_input(min, max);
    }

    /// Get the output of the controller for the given measurement and goal
    /// position.
    ///
    /// The profile setpoint is advanced by one period towards the goal and the
    /// PID acts on the error between the new setpoint and the measurement.
    pub fn calculate(&mut self, measurement: f64, goal: f64) -> f64 {
        let mut setpoint = match self.setpoint {
            Some(s) => s,
            None => ProfileState::new(measurement, 0.0),
        };
        let mut goal = ProfileState::new(goal, 0.0);

        // Express the goal and setpoint as the closest equivalent positions to
        // the measurement so the profile takes the short way round.
        if let Some((min, max)) = self.pid.continuous_range {
            let bound = (max - min) / 2.0;
            goal.position = input_modulus(goal.position - measurement, -bound, bound) + measurement;
            setpoint.position =
                input_modulus(setpoint.position - measurement, -bound, bound) + measurement;
        }

        let setpoint = self.profile.calculate(self.pid.period_s, setpoint, goal);

        self.setpoint = Some(setpoint);
        self.goal = goal;

        self.pid.calculate(measurement, setpoint.position)
    }

    /// Clear the controller history. The profile is seeded from the next
    /// measurement.
    pub fn reset(&mut self) {
        self.pid.reset();
        self.setpoint = None;
    }

    pub fn setpoint(&self) -> Option<ProfileState> {
        self.setpoint
    }

    pub fn goal(&self) -> ProfileState {
        self.goal
    }

    /// Error between the current setpoint and the measurement.
    pub fn error(&self) -> f64 {
        self.pid.error()
    }

    pub fn tolerance(&self) -> f64 {
        self.pid.tolerance
    }

    pub fn at_setpoint(&self) -> bool {
        self.pid.at_setpoint()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pid_zero_error() {
        let mut pid = PidController::new(&PidParams::new(1.0, 0.5, 0.1), 0.02);

        for _ in 0..10 {
            assert_eq!(pid.calculate(1.5, 1.5), 0.0);
        }
        assert!(pid.at_setpoint());
    }

    #[test]
    fn test_pid_terms() {
        let mut pid = PidController::new(&PidParams::new(2.0, 0.0, 0.1), 0.02);

        // First call has no derivative
        assert!((pid.calculate(0.0, 1.0) - 2.0).abs() < 1e-12);

        // Error falls by 0.2 over one period, derivative of -10
        assert!((pid.calculate(0.2, 1.0) - (1.6 - 1.0)).abs() < 1e-12);

        pid.reset();
        assert!((pid.calculate(0.2, 1.0) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_pid_integrator_range() {
        let mut params = PidParams::new(0.0, 2.0, 0.0);
        params.integrator_range = [-0.3, 0.3];
        let mut pid = PidController::new(&params, 0.02);

        let mut out = 0.0;
        for _ in 0..1000 {
            out = pid.calculate(0.0, 10.0);
        }
        assert!((out - 0.3).abs() < 1e-12);

        for _ in 0..1000 {
            out = pid.calculate(10.0, 0.0);
        }
        assert!((out + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_pid_continuous() {
        let mut pid = PidController::new(&PidParams::new(1.0, 0.0, 0.0), 0.02);
        pid.enable_continuous_input(-PI, PI);

        // Shortest way from just below pi to just above -pi is positive
        let out = pid.calculate(PI - 0.1, -PI + 0.1);
        assert!((out - 0.2).abs() < 1e-9);
    }

    fn theta_params() -> ProfiledPidParams {
        ProfiledPidParams {
            pid: PidParams::new(1.3, 0.0, 0.0),
            max_vel_rads: 6.0,
            max_accel_radss: 12.0,
        }
    }

    #[test]
    fn test_profiled_zero_error() {
        let mut ctrl = ProfiledPidController::new(&theta_params(), 0.02);
        ctrl.enable_continuous_input(-PI, PI);

        for _ in 0..10 {
            assert_eq!(ctrl.calculate(0.7, 0.7), 0.0);
        }
    }

    #[test]
    fn test_profiled_follows_profile() {
        let mut ctrl = ProfiledPidController::new(&theta_params(), 0.02);
        ctrl.enable_continuous_input(-PI, PI);

        // Seeded at the measurement, so the first setpoint is one period of
        // acceleration away from it rather than at the goal.
        let out = ctrl.calculate(0.0, 1.0);
        assert!((ctrl.setpoint().unwrap().position - 0.0024).abs() < 1e-12);
        assert!((out - 1.3 * 0.0024).abs() < 1e-12);

        // Wrapping goal takes the short way round
        ctrl.reset();
        let out = ctrl.calculate(PI - 0.05, -PI + 0.05);
        assert!(out > 0.0);
        assert!((ctrl.goal().position - (PI + 0.05)).abs() < 1e-9);
    }
}
