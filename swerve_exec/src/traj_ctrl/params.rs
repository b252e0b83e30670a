//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::TrajCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Period between controller updates.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Field X position controller
    pub x_ctrl: PidParams,

    /// Field Y position controller
    pub y_ctrl: PidParams,

    /// Heading controller
    pub theta_ctrl: ProfiledPidParams,
}

/// Gains and limits for a single PID controller.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    #[serde(default)]
    pub k_i: f64,

    /// Derivative gain
    #[serde(default)]
    pub k_d: f64,

    /// Minimum and maximum contribution of the integral term to the output.
    #[serde(default = "default_integrator_range")]
    pub integrator_range: [f64; 2],

    /// Error below which the controller is considered to be at its setpoint.
    ///
    /// Used for reporting only.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

/// Parameters for a PID controller following a trapezoidal profile.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ProfiledPidParams {
    #[serde(flatten)]
    pub pid: PidParams,

    /// Maximum rate of the profile.
    ///
    /// Units: radians/second
    pub max_vel_rads: f64,

    /// Maximum acceleration of the profile.
    ///
    /// Units: radians/second^2
    pub max_accel_radss: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check that the parameters describe a usable set of controllers.
    pub fn validate(&self) -> Result<(), TrajCtrlError> {
        if !(self.period_s.is_finite() && self.period_s > 0.0) {
            return Err(TrajCtrlError::InvalidPeriod(self.period_s));
        }

        self.x_ctrl.validate("x")?;
        self.y_ctrl.validate("y")?;
        self.theta_ctrl.pid.validate("theta")?;

        let t = &self.theta_ctrl;
        if !(t.max_vel_rads.is_finite()
            && t.max_vel_rads > 0.0
            && t.max_accel_radss.is_finite()
            && t.max_accel_radss > 0.0)
        {
            return Err(TrajCtrlError::InvalidProfileLimits {
                max_vel_rads: t.max_vel_rads,
                max_accel_radss: t.max_accel_radss,
            });
        }

        Ok(())
    }
}

impl PidParams {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            integrator_range: default_integrator_range(),
            tolerance: default_tolerance(),
        }
    }

    fn validate(&self, axis: &'static str) -> Result<(), TrajCtrlError> {
        if !(self.k_p.is_finite() && self.k_i.is_finite() && self.k_d.is_finite()) {
            return Err(TrajCtrlError::InvalidGains(axis));
        }

        let [min, max] = self.integrator_range;
        if min.is_nan() || max.is_nan() || min > max {
            return Err(TrajCtrlError::InvalidIntegratorRange { axis, min, max });
        }

        if !(self.tolerance >= 0.0) {
            return Err(TrajCtrlError::InvalidTolerance {
                axis,
                tolerance: self.tolerance,
            });
        }

        Ok(())
    }
}

fn default_integrator_range() -> [f64; 2] {
    [-1.0, 1.0]
}

fn default_tolerance() -> f64 {
    0.05
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load() {
        let params: Params = util::params::parse(
            r#"
            period_s = 0.02

            [x_ctrl]
            k_p = 1.0
            integrator_range = [-0.3, 0.3]

            [y_ctrl]
            k_p = 0.7

            [theta_ctrl]
            k_p = 1.3
            tolerance = 0.0175
            max_vel_rads = 6.0
            max_accel_radss = 12.0
            "#,
        )
        .unwrap();

        assert_eq!(params.x_ctrl.integrator_range, [-0.3, 0.3]);
        assert_eq!(params.y_ctrl.k_i, 0.0);
        assert_eq!(params.y_ctrl.integrator_range, [-1.0, 1.0]);
        assert_eq!(params.theta_ctrl.pid.k_p, 1.3);
        assert_eq!(params.theta_ctrl.max_accel_radss, 12.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut params = Params {
            period_s: 0.02,
            x_ctrl: PidParams::new(1.0, 0.0, 0.0),
            y_ctrl: PidParams::new(1.0, 0.0, 0.0),
            theta_ctrl: ProfiledPidParams {
                pid: PidParams::new(1.0, 0.0, 0.0),
                max_vel_rads: 6.0,
                max_accel_radss: 12.0,
            },
        };
        assert!(params.validate().is_ok());

        params.y_ctrl.integrator_range = [1.0, -1.0];
        assert!(matches!(
            params.validate(),
            Err(TrajCtrlError::InvalidIntegratorRange { axis: "y", .. })
        ));

        params.y_ctrl.integrator_range = [-1.0, 1.0];
        params.period_s = 0.0;
        assert_eq!(params.validate(), Err(TrajCtrlError::InvalidPeriod(0.0)));
    }
}
