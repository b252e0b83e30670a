//! Trajectory data and time sampling

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::loc::Pose;
use util::maths::{lerp, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point along a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryState {
    /// Time since the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Desired pose at this time.
    pub pose: Pose,

    /// Signed velocity along the path tangent.
    ///
    /// Units: meters/second
    pub vel_ms: f64,

    /// Acceleration along the path tangent.
    ///
    /// Units: meters/second^2
    pub accel_mss: f64,

    /// Path curvature.
    ///
    /// Units: radians/meter
    pub curvature_radm: f64,
}

/// A time parameterised path.
///
/// A trajectory always holds at least one state, with the first state at time
/// zero and timestamps strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    states: Vec<TrajectoryState>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Build a trajectory from a set of states.
    ///
    /// Only used by the generator, which guarantees the states are non-empty
    /// and ordered.
    pub(super) fn from_states(states: Vec<TrajectoryState>) -> Self {
        debug_assert!(!states.is_empty());
        Self { states }
    }

    pub fn states(&self) -> &[TrajectoryState] {
        &self.states
    }

    /// Total duration of the trajectory in seconds.
    pub fn duration_s(&self) -> f64 {
        self.end().time_s
    }

    pub fn start(&self) -> &TrajectoryState {
        &self.states[0]
    }

    pub fn end(&self) -> &TrajectoryState {
        &self.states[self.states.len() - 1]
    }

    /// Get the desired state at the given time since the start of the
    /// trajectory.
    ///
    /// Times before the start give the first state, and times after the end
    /// give the last state.
    pub fn sample(&self, time_s: f64) -> TrajectoryState {
        let first = self.start();
        let last = self.end();

        if !(time_s > first.time_s) {
            return *first;
        }
        if time_s >= last.time_s {
            return *last;
        }

        // Index of the first state after the sample time, which is always
        // between 1 and len - 1 given the checks above.
        let idx = self.states.partition_point(|s| s.time_s <= time_s);
        let prev = &self.states[idx - 1];
        let next = &self.states[idx];

        let frac = (time_s - prev.time_s) / (next.time_s - prev.time_s);

        // Headings are interpolated along the shortest arc
        let heading_rad = prev.pose.heading_rad
            + wrap_pi(next.pose.heading_rad - prev.pose.heading_rad) * frac;

        TrajectoryState {
            time_s,
            pose: Pose::new(
                lerp(prev.pose.x(), next.pose.x(), frac),
                lerp(prev.pose.y(), next.pose.y(), frac),
                heading_rad,
            ),
            vel_ms: lerp(prev.vel_ms, next.vel_ms, frac),
            accel_mss: lerp(prev.accel_mss, next.accel_mss, frac),
            curvature_radm: lerp(prev.curvature_radm, next.curvature_radm, frac),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    fn state(time_s: f64, x: f64, heading_rad: f64, vel_ms: f64) -> TrajectoryState {
        TrajectoryState {
            time_s,
            pose: Pose::new(x, 0.0, heading_rad),
            vel_ms,
            accel_mss: 0.0,
            curvature_radm: 0.0,
        }
    }

    #[test]
    fn test_sample_interpolates() {
        let traj = Trajectory::from_states(vec![
            state(0.0, 0.0, 0.0, 0.0),
            state(1.0, 1.0, 0.0, 1.0),
            state(2.0, 3.0, 0.0, 3.0),
        ]);

        let s = traj.sample(0.5);
        assert!((s.pose.x() - 0.5).abs() < 1e-12);
        assert!((s.vel_ms - 0.5).abs() < 1e-12);

        let s = traj.sample(1.5);
        assert!((s.pose.x() - 2.0).abs() < 1e-12);
        assert!((s.vel_ms - 2.0).abs() < 1e-12);

        // Exactly on a state
        assert_eq!(traj.sample(1.0).pose, traj.states()[1].pose);
    }

    #[test]
    fn test_sample_clamps() {
        let traj = Trajectory::from_states(vec![
            state(0.0, 0.0, 0.0, 0.0),
            state(2.0, 3.0, 0.0, 0.0),
        ]);

        assert_eq!(traj.sample(-1.0), traj.sample(0.0));
        assert_eq!(traj.sample(10.0), traj.sample(2.0));
        assert_eq!(traj.sample(10.0), *traj.end());
        assert_eq!(traj.duration_s(), 2.0);
    }

    #[test]
    fn test_sample_heading_shortest_arc() {
        let traj = Trajectory::from_states(vec![
            state(0.0, 0.0, PI - 0.1, 0.0),
            state(1.0, 0.0, -PI + 0.1, 0.0),
        ]);

        // Halfway between should pass through pi rather than zero
        let s = traj.sample(0.5);
        assert!((s.pose.heading_rad.abs() - PI).abs() < 1e-9);
    }

    #[test]
    fn test_single_state() {
        let traj = Trajectory::from_states(vec![state(0.0, 1.0, 0.0, 0.0)]);

        assert_eq!(traj.duration_s(), 0.0);
        assert_eq!(traj.sample(0.3), traj.states()[0]);
    }
}
