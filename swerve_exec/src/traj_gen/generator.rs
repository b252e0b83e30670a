//! Straight line trapezoidal trajectory generator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::params::{check_velocity, LIMIT_EPSILON};
use super::{InfeasibleCause, TrajConfig, TrajGenError, Trajectory, TrajectoryState};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Start and goal positions closer than this are treated as coincident.
///
/// Units: meters
const COINCIDENT_DIST_M: f64 = 1e-9;

/// Maximum number of states a single trajectory may contain.
const MAX_STATES: usize = 100_000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A trapezoidal velocity profile along a path of known length.
#[derive(Debug, Clone, Copy)]
struct Profile {
    start_vel_ms: f64,
    peak_vel_ms: f64,
    end_vel_ms: f64,
    accel_mss: f64,

    accel_time_s: f64,
    cruise_time_s: f64,
    decel_time_s: f64,

    accel_dist_m: f64,
    cruise_dist_m: f64,
    total_dist_m: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Generate a straight line trajectory from the start pose to the goal pose.
///
/// The vehicle is assumed to already be moving along the path at
/// `start_vel_ms`, allowing a new trajectory to be generated while moving
/// without first stopping. Both the start and end headings of the trajectory
/// are the bearing from start to goal.
///
/// If the start and goal are coincident and both the start and end velocities
/// are zero a single state, zero duration, trajectory holding the start pose
/// is returned.
pub fn generate(
    start: &Pose,
    start_vel_ms: f64,
    goal: &Pose,
    config: &TrajConfig,
) -> Result<Trajectory, TrajGenError> {
    validate(start, start_vel_ms, goal, config)?;

    // Slight overshoots of the limit (for example from interpolation) are
    // pulled back onto it.
    let start_vel_ms = start_vel_ms.min(config.max_vel_ms);
    let end_vel_ms = config.end_vel_ms.min(config.max_vel_ms);

    let dist_m = start.distance_to(goal);

    if dist_m < COINCIDENT_DIST_M {
        if start_vel_ms == 0.0 && end_vel_ms == 0.0 {
            debug!("Start and goal coincident, generated stationary trajectory");
            return Ok(Trajectory::from_states(vec![TrajectoryState {
                time_s: 0.0,
                pose: *start,
                vel_ms: 0.0,
                accel_mss: 0.0,
                curvature_radm: 0.0,
            }]));
        }

        return Err(TrajGenError::InfeasiblePath(InfeasibleCause::TooShort {
            dist_m,
            required_m: stopping_dist_m(start_vel_ms, end_vel_ms, config.max_accel_mss),
            start_vel_ms,
            end_vel_ms,
        }));
    }

    let required_m = stopping_dist_m(start_vel_ms, end_vel_ms, config.max_accel_mss);
    if required_m > dist_m + LIMIT_EPSILON {
        return Err(TrajGenError::InfeasiblePath(InfeasibleCause::TooShort {
            dist_m,
            required_m,
            start_vel_ms,
            end_vel_ms,
        }));
    }

    let profile = Profile::new(
        dist_m,
        start_vel_ms,
        end_vel_ms,
        config.max_vel_ms,
        config.max_accel_mss,
    );

    let heading_rad = start.bearing_to(goal);
    let direction = (goal.position_m - start.position_m) / dist_m;
    let duration_s = profile.duration_s();

    // One state per sample period plus the final state at the goal
    let num_samples = (duration_s / config.sample_period_s).ceil();
    if !(num_samples < MAX_STATES as f64) {
        return Err(TrajGenError::InfeasiblePath(
            InfeasibleCause::InvalidSamplePeriod(config.sample_period_s),
        ));
    }

    let mut states = Vec::with_capacity(num_samples as usize + 2);

    // The state at t = 0 is always emitted, even for durations shorter than
    // the tolerance on the final sample.
    let mut step = 0usize;
    loop {
        let time_s = step as f64 * config.sample_period_s;
        if step > 0 && time_s >= duration_s - LIMIT_EPSILON {
            break;
        }

        let (dist_m, vel_ms, accel_mss) = profile.at(time_s);
        states.push(TrajectoryState {
            time_s,
            pose: Pose::from_position(start.position_m + direction * dist_m, heading_rad),
            vel_ms,
            accel_mss,
            curvature_radm: 0.0,
        });

        step += 1;
    }

    // The final state always lands exactly on the goal
    states.push(TrajectoryState {
        time_s: duration_s,
        pose: Pose::from_position(goal.position_m, heading_rad),
        vel_ms: profile.end_vel_ms,
        accel_mss: if profile.decel_time_s > 0.0 { -profile.accel_mss } else { 0.0 },
        curvature_radm: 0.0,
    });

    debug!(
        "Generated trajectory from {} to {}: {:.3} m, {:.3} s, peak {:.3} m/s, {} states",
        start,
        goal,
        dist_m,
        duration_s,
        profile.peak_vel_ms,
        states.len()
    );

    Ok(Trajectory::from_states(states))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn validate(
    start: &Pose,
    start_vel_ms: f64,
    goal: &Pose,
    config: &TrajConfig,
) -> Result<(), TrajGenError> {
    config.validate().map_err(TrajGenError::InfeasiblePath)?;

    check_velocity("start", start_vel_ms, config.max_vel_ms)
        .map_err(TrajGenError::InfeasiblePath)?;

    let finite = |p: &Pose| p.x().is_finite() && p.y().is_finite() && p.heading_rad.is_finite();
    if !(finite(start) && finite(goal)) {
        return Err(TrajGenError::InfeasiblePath(InfeasibleCause::NonFinitePose));
    }

    Ok(())
}

/// Distance needed to change speed between the two velocities at the given
/// acceleration.
fn stopping_dist_m(start_vel_ms: f64, end_vel_ms: f64, accel_mss: f64) -> f64 {
    (start_vel_ms.powi(2) - end_vel_ms.powi(2)).abs() / (2.0 * accel_mss)
}

impl Profile {
    /// Build the profile. The distance must be positive and long enough to
    /// change from the start to the end velocity.
    fn new(
        dist_m: f64,
        start_vel_ms: f64,
        end_vel_ms: f64,
        max_vel_ms: f64,
        accel_mss: f64,
    ) -> Self {
        // Peak velocity if the profile were a triangle, capped at the maximum
        let peak_vel_ms = ((2.0 * accel_mss * dist_m + start_vel_ms.powi(2) + end_vel_ms.powi(2))
            / 2.0)
            .sqrt()
            .min(max_vel_ms)
            .max(start_vel_ms.max(end_vel_ms));

        let accel_time_s = (peak_vel_ms - start_vel_ms) / accel_mss;
        let decel_time_s = (peak_vel_ms - end_vel_ms) / accel_mss;

        let accel_dist_m = (peak_vel_ms.powi(2) - start_vel_ms.powi(2)) / (2.0 * accel_mss);
        let decel_dist_m = (peak_vel_ms.powi(2) - end_vel_ms.powi(2)) / (2.0 * accel_mss);

        let cruise_dist_m = (dist_m - accel_dist_m - decel_dist_m).max(0.0);
        let cruise_time_s = cruise_dist_m / peak_vel_ms;

        Self {
            start_vel_ms,
            peak_vel_ms,
            end_vel_ms,
            accel_mss,
            accel_time_s,
            cruise_time_s,
            decel_time_s,
            accel_dist_m,
            cruise_dist_m,
            total_dist_m: dist_m,
        }
    }

    fn duration_s(&self) -> f64 {
        self.accel_time_s + self.cruise_time_s + self.decel_time_s
    }

    /// Distance, velocity and acceleration at the given time.
    fn at(&self, time_s: f64) -> (f64, f64, f64) {
        let a = self.accel_mss;

        let (dist_m, vel_ms, accel_mss) = if time_s < self.accel_time_s {
            (
                self.start_vel_ms * time_s + 0.5 * a * time_s.powi(2),
                self.start_vel_ms + a * time_s,
                a,
            )
        } else if time_s < self.accel_time_s + self.cruise_time_s {
            (
                self.accel_dist_m + self.peak_vel_ms * (time_s - self.accel_time_s),
                self.peak_vel_ms,
                0.0,
            )
        } else {
            let t = time_s - self.accel_time_s - self.cruise_time_s;
            (
                self.accel_dist_m + self.cruise_dist_m + self.peak_vel_ms * t - 0.5 * a * t.powi(2),
                self.peak_vel_ms - a * t,
                -a,
            )
        };

        (dist_m.max(0.0).min(self.total_dist_m), vel_ms.max(0.0), accel_mss)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
