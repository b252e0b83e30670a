//! Simulated swerve robot

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use std::{cell::RefCell, rc::Rc};

// Internal
use super::Params;
use crate::{
    loc::Pose,
    loco_ctrl::{ChassisVel, SwerveKinematics, WheelState, NUM_MODULES},
    wpt_ctrl::{GoalOffset, GoalOffsetSource, Gyro, PoseSource, WheelStateSink},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of the simulated robot.
pub struct SimRobot {
    params: Params,

    kinematics: SwerveKinematics,

    /// Simulation time
    ///
    /// Units: seconds
    time_s: f64,

    /// True pose of the robot
    pose: Pose,

    /// Most recently demanded wheel states, which the robot executes exactly
    wheel_states: [WheelState; NUM_MODULES],

    /// Robot relative velocity over the last step
    vel: ChassisVel,
}

/// Shared handle to the simulated robot.
///
/// The handle implements each of the interfaces waypoint control needs, so
/// clones of it can be passed as the pose source, gyro, offset source and
/// wheel state sink while the simulation loop steps the same robot.
#[derive(Clone)]
pub struct SimHandle(Rc<RefCell<SimRobot>>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimRobot {
    pub fn new(params: Params, kinematics: SwerveKinematics) -> Self {
        Self {
            pose: params.start_pose,
            params,
            kinematics,
            time_s: 0.0,
            wheel_states: [WheelState::default(); NUM_MODULES],
            vel: ChassisVel::default(),
        }
    }

    /// Wrap the robot in a shared handle.
    pub fn into_handle(self) -> SimHandle {
        SimHandle(Rc::new(RefCell::new(self)))
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Advance the simulation by the given time, moving the robot according
    /// to the current wheel states.
    pub fn step(&mut self, dt_s: f64) {
        let mut vel = self.kinematics.to_chassis_vel(&self.wheel_states);
        vel.omega_rads += self.params.heading_drift_rads;

        // Integrate using the heading at the middle of the step
        let mid_heading_rad = self.pose.heading_rad + 0.5 * vel.omega_rads * dt_s;
        let field = vel.to_field_relative(mid_heading_rad);

        self.pose = Pose::new(
            self.pose.x() + field.vx_ms * dt_s,
            self.pose.y() + field.vy_ms * dt_s,
            self.pose.heading_rad + vel.omega_rads * dt_s,
        );
        self.vel = vel;
        self.time_s += dt_s;

        trace!("Sim t = {:.3} s, pose {}", self.time_s, self.pose);
    }

    /// The goal offset selected by the script at the current time.
    pub fn offset(&self) -> GoalOffset {
        self.params
            .offset_script
            .iter()
            .take_while(|e| e.time_s <= self.time_s)
            .last()
            .map(|e| e.offset)
            .unwrap_or_default()
    }
}

impl SimHandle {
    /// Advance the simulation by the given time.
    pub fn step(&self, dt_s: f64) {
        self.0.borrow_mut().step(dt_s);
    }

    pub fn pose(&self) -> Pose {
        self.0.borrow().pose()
    }

    pub fn time_s(&self) -> f64 {
        self.0.borrow().time_s()
    }
}

impl PoseSource for SimHandle {
    fn get_pose(&self) -> Pose {
        self.0.borrow().pose
    }
}

impl Gyro for SimHandle {
    fn get_rate_correction(&self) -> f64 {
        let robot = self.0.borrow();
        robot.vel.omega_rads * robot.params.gyro_correction_gain
    }
}

impl GoalOffsetSource for SimHandle {
    fn get_offset(&self) -> GoalOffset {
        self.0.borrow().offset()
    }
}

impl WheelStateSink for SimHandle {
    fn apply_wheel_states(&mut self, states: &[WheelState; NUM_MODULES]) {
        self.0.borrow_mut().wheel_states = *states;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{loco_ctrl, sim::OffsetEvent};
    use std::f64::consts::FRAC_PI_2;

    fn robot(start_pose: Pose, offset_script: Vec<OffsetEvent>) -> SimRobot {
        let kinematics = SwerveKinematics::new(loco_ctrl::Params {
            module_pos_m_rb: [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]],
            max_wheel_speed_ms: 4.5,
        })
        .unwrap();

        SimRobot::new(
            Params {
                start_pose,
                gyro_correction_gain: 0.25,
                heading_drift_rads: 0.0,
                run_duration_s: 10.0,
                realtime: false,
                offset_script,
            },
            kinematics,
        )
    }

    #[test]
    fn test_step() {
        let kin = SwerveKinematics::new(loco_ctrl::Params {
            module_pos_m_rb: [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]],
            max_wheel_speed_ms: 4.5,
        })
        .unwrap();

        // Facing +Y and driving forwards moves along field +Y
        let mut handle = robot(Pose::new(0.0, 0.0, FRAC_PI_2), vec![]).into_handle();
        handle.apply_wheel_states(&kin.to_wheel_states(&ChassisVel::new(1.0, 0.0, 0.0)));

        for _ in 0..50 {
            handle.step(0.02);
        }

        let pose = handle.get_pose();
        assert!(pose.x().abs() < 1e-9);
        assert!((pose.y() - 1.0).abs() < 1e-9);
        assert!((handle.time_s() - 1.0).abs() < 1e-9);
        assert!(handle.get_rate_correction().abs() < 1e-12);
    }

    #[test]
    fn test_gyro() {
        let kin = SwerveKinematics::new(loco_ctrl::Params {
            module_pos_m_rb: [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]],
            max_wheel_speed_ms: 4.5,
        })
        .unwrap();

        let mut handle = robot(Pose::default(), vec![]).into_handle();
        handle.apply_wheel_states(&kin.to_wheel_states(&ChassisVel::new(0.0, 0.0, 2.0)));
        handle.step(0.1);

        assert!((handle.get_rate_correction() - 0.5).abs() < 1e-9);
        assert!((handle.get_pose().heading_rad - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_offset_script() {
        let handle = robot(
            Pose::default(),
            vec![
                OffsetEvent {
                    time_s: 0.2,
                    offset: GoalOffset::Left,
                },
                OffsetEvent {
                    time_s: 0.5,
                    offset: GoalOffset::Right,
                },
            ],
        )
        .into_handle();

        assert_eq!(handle.get_offset(), GoalOffset::Center);
        handle.step(0.25);
        assert_eq!(handle.get_offset(), GoalOffset::Left);
        handle.step(0.25);
        assert_eq!(handle.get_offset(), GoalOffset::Right);
    }
}
