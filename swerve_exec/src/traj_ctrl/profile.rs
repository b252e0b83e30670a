//! Trapezoidal motion profile for setpoint shaping

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limits on the motion of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Constraints {
    pub max_vel: f64,
    pub max_accel: f64,
}

/// A position and velocity along a one dimensional profile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

/// A one dimensional trapezoidal motion profile.
///
/// The profile accelerates from the current state up to the maximum
/// velocity, cruises, then decelerates onto the goal state, respecting the
/// constraints throughout. Profiles are recomputed from the latest state each
/// cycle so only the state one period ahead is ever needed.
#[derive(Debug, Clone, Copy)]
pub struct TrapezoidProfile {
    constraints: Constraints,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProfileState {
    pub fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }

    fn directed(&self, direction: f64) -> Self {
        Self::new(self.position * direction, self.velocity * direction)
    }
}

impl TrapezoidProfile {
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    /// Calculate the state of the profile `time_s` after `current`, when
    /// heading towards `goal`.
    pub fn calculate(
        &self,
        time_s: f64,
        current: ProfileState,
        goal: ProfileState,
    ) -> ProfileState {
        let max_vel = self.constraints.max_vel;
        let max_accel = self.constraints.max_accel;

        // Solve the profile as if always moving in the positive direction,
        // flipping into and out of that frame.
        let direction = if current.position > goal.position { -1.0 } else { 1.0 };
        let mut current = current.directed(direction);
        let goal = goal.directed(direction);

        if current.velocity > max_vel {
            current.velocity = max_vel;
        }

        // Treat the current and goal velocities as points part way along a
        // full trapezoid starting and ending at rest.
        let cutoff_begin = current.velocity / max_accel;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_accel / 2.0;

        let cutoff_end = goal.velocity / max_accel;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_accel / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;

        let mut accel_time = max_vel / max_accel;
        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_accel;

        // Never reaches full speed, so the profile is a triangle
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_accel).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = accel_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_vel;
        let end_decel = end_full_speed + accel_time - cutoff_end;

        let mut result = current;

        if time_s < end_accel {
            result.velocity += time_s * max_accel;
            result.position += (current.velocity + time_s * max_accel / 2.0) * time_s;
        } else if time_s < end_full_speed {
            result.velocity = max_vel;
            result.position += (current.velocity + end_accel * max_accel / 2.0) * end_accel
                + max_vel * (time_s - end_accel);
        } else if time_s <= end_decel {
            let time_left = end_decel - time_s;
            result.velocity = goal.velocity + time_left * max_accel;
            result.position =
                goal.position - (goal.velocity + time_left * max_accel / 2.0) * time_left;
        } else {
            result = goal;
        }

        result.directed(direction)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn profile() -> TrapezoidProfile {
        TrapezoidProfile::new(Constraints {
            max_vel: 6.0,
            max_accel: 12.0,
        })
    }

    #[test]
    fn test_reaches_goal() {
        let profile = profile();
        let goal = ProfileState::new(3.0, 0.0);
        let mut state = ProfileState::default();

        for _ in 0..200 {
            let next = profile.calculate(0.02, state, goal);

            // Limits respected
            assert!(next.velocity.abs() <= 6.0 + 1e-9);
            assert!((next.velocity - state.velocity).abs() <= 12.0 * 0.02 + 1e-9);

            state = next;
        }

        assert_eq!(state, goal);
    }

    #[test]
    fn test_first_step() {
        let state = profile().calculate(0.02, ProfileState::default(), ProfileState::new(3.0, 0.0));

        assert!((state.velocity - 0.24).abs() < 1e-12);
        assert!((state.position - 0.0024).abs() < 1e-12);
    }

    #[test]
    fn test_reversed() {
        let forwards =
            profile().calculate(0.1, ProfileState::default(), ProfileState::new(1.0, 0.0));
        let backwards =
            profile().calculate(0.1, ProfileState::default(), ProfileState::new(-1.0, 0.0));

        assert!((forwards.position + backwards.position).abs() < 1e-12);
        assert!((forwards.velocity + backwards.velocity).abs() < 1e-12);
    }

    #[test]
    fn test_at_goal() {
        let goal = ProfileState::new(0.4, 0.0);
        assert_eq!(profile().calculate(0.02, goal, goal), goal);
    }
}
