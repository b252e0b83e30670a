//! Implementation of the waypoint control state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{Collaborators, GoalOffset, Params, TickSnapshot, WptCtrlError};
use crate::{
    loc::Pose,
    loco_ctrl::{self, SwerveKinematics},
    traj_ctrl::{self, HolonomicController, TrackingErrors},
    traj_gen::{self, TrajGenError, Trajectory},
};
use util::{
    module::PeriodicTask,
    time::{TimeSource, Timer},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Waypoint control module state
pub struct WptCtrl {
    params: Params,

    mode: WptCtrlMode,

    collab: Collaborators,

    controller: HolonomicController,
    kinematics: SwerveKinematics,

    /// Time since the start of the current trajectory
    timer: Timer,

    /// The trajectory being tracked, `None` until one has been generated
    trajectory: Option<Trajectory>,

    /// The goal of the current trajectory, including the offset
    goal: Option<Pose>,

    /// The offset selection the current trajectory was generated for
    prev_offset: GoalOffset,
}

/// Status report for WptCtrl processing.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StatusReport {
    /// Mode at the end of the cycle
    pub mode: WptCtrlMode,

    /// Time since the start of the active trajectory.
    ///
    /// Units: seconds
    pub elapsed_s: f64,

    /// `true` if a new trajectory was generated this cycle because the goal
    /// offset changed.
    pub replanned: bool,

    /// Start velocity of the new trajectory, if replanned this cycle.
    ///
    /// Units: meters/second
    pub replan_start_vel_ms: Option<f64>,

    /// Tracking errors for this cycle
    pub errors: TrackingErrors,

    /// `true` if wheel states were sent to the sink this cycle.
    pub wheel_states_emitted: bool,

    /// `true` if wheel speeds had to be scaled down to within limits.
    pub wheel_speed_limited: bool,

    /// `true` if all controllers were within tolerance of the reference.
    pub at_reference: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum WptCtrlMode {
    /// Not yet started
    Idle,

    /// Following the current trajectory
    Tracking,

    /// Generating a new trajectory for a changed goal offset. Only held within
    /// a single cycle.
    Replanning,

    /// Trajectory generation failed, nothing is output until restarted
    Failed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WptCtrl {
    /// Create a new instance of waypoint control.
    ///
    /// All parameters are checked here so that configuration problems are
    /// reported before any processing begins.
    pub fn new<T: TimeSource + 'static>(
        params: Params,
        traj_ctrl_params: &traj_ctrl::Params,
        loco_ctrl_params: loco_ctrl::Params,
        collab: Collaborators,
        time_source: T,
    ) -> Result<Self, WptCtrlError> {
        params
            .traj
            .validate()
            .map_err(WptCtrlError::InvalidTrajConfig)?;

        if !params.y_offset_m.is_finite() {
            return Err(WptCtrlError::InvalidOffset(params.y_offset_m));
        }

        let goal = &params.goal_pose;
        if !(goal.x().is_finite() && goal.y().is_finite() && goal.heading_rad.is_finite()) {
            return Err(WptCtrlError::InvalidGoal(*goal));
        }

        Ok(Self {
            controller: HolonomicController::new(traj_ctrl_params)?,
            kinematics: SwerveKinematics::new(loco_ctrl_params)?,
            params,
            mode: WptCtrlMode::Idle,
            collab,
            timer: Timer::new(time_source),
            trajectory: None,
            goal: None,
            prev_offset: GoalOffset::default(),
        })
    }

    pub fn mode(&self) -> WptCtrlMode {
        self.mode
    }

    /// The trajectory currently being tracked.
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    /// The goal of the current trajectory, including any offset.
    pub fn goal(&self) -> Option<Pose> {
        self.goal
    }

    /// Time since the start of the current trajectory.
    pub fn elapsed_s(&self) -> f64 {
        self.timer.get()
    }

    /// Generate a new trajectory from the current pose to the goal for the
    /// given offset.
    fn plan(&mut self, offset: GoalOffset, start_vel_ms: f64) -> Result<(), TrajGenError> {
        let pose = self.collab.pose_source.get_pose();
        let goal = offset.apply(&self.params.goal_pose, self.params.y_offset_m);

        let trajectory = traj_gen::generate(&pose, start_vel_ms, &goal, &self.params.traj)?;

        if let Some(ref mut obs) = self.collab.observer {
            obs.on_trajectory(&trajectory);
        }

        self.trajectory = Some(trajectory);
        self.goal = Some(goal);

        Ok(())
    }

    /// Move into the failed mode after a generation error.
    fn fail(&mut self, err: TrajGenError) {
        warn!("WptCtrl failed: {}", err);
        self.mode = WptCtrlMode::Failed;
    }

    /// Replan towards the new offset, keeping the velocity the vehicle should
    /// have right now.
    ///
    /// Returns the start velocity of the new trajectory.
    fn replan(&mut self, offset: GoalOffset) -> Result<f64, TrajGenError> {
        self.mode = WptCtrlMode::Replanning;

        let start_vel_ms = match self.trajectory {
            Some(ref t) => t.sample(self.timer.get()).vel_ms.abs(),
            None => 0.0,
        };

        info!(
            "Goal offset changed from {:?} to {:?}, replanning with start velocity {:.3} m/s",
            self.prev_offset, offset, start_vel_ms
        );

        self.plan(offset, start_vel_ms)?;

        self.timer.restart();
        self.controller.reset();
        self.prev_offset = offset;
        self.mode = WptCtrlMode::Tracking;

        Ok(start_vel_ms)
    }

    /// Track the current trajectory for this cycle.
    fn track(&mut self, report: &mut StatusReport) {
        let trajectory = match self.trajectory {
            Some(ref t) => t,
            None => return,
        };

        let elapsed_s = self.timer.get();
        let desired = trajectory.sample(elapsed_s);
        let measured_pose = self.collab.pose_source.get_pose();
        let desired_heading_rad = self.params.goal_pose.heading_rad;

        let chassis_vel = self.controller.calculate(
            &measured_pose,
            &desired,
            desired_heading_rad,
            self.collab.gyro.get_rate_correction(),
        );

        let mut wheel_states = self.kinematics.to_wheel_states(&chassis_vel);
        report.wheel_speed_limited = self.kinematics.desaturate(&mut wheel_states);

        self.collab.sink.apply_wheel_states(&wheel_states);

        report.elapsed_s = elapsed_s;
        report.errors = self.controller.errors();
        report.at_reference = self.controller.at_reference();
        report.wheel_states_emitted = true;

        trace!(
            "WptCtrl t = {:.3} s: chassis {:?}, wheels {:?}",
            elapsed_s,
            chassis_vel,
            wheel_states
        );

        if let Some(ref mut obs) = self.collab.observer {
            obs.on_tick(&TickSnapshot {
                elapsed_s,
                measured_pose,
                desired,
                desired_heading_rad,
                errors: report.errors,
                chassis_vel,
                wheel_states,
            });
        }
    }
}

impl PeriodicTask for WptCtrl {
    type StatusReport = StatusReport;

    /// Generate the initial trajectory from the current pose and begin
    /// tracking it.
    fn start(&mut self) {
        self.timer.restart();
        self.prev_offset = self.collab.offset_source.get_offset();
        self.controller.reset();

        match self.plan(self.prev_offset, 0.0) {
            Ok(()) => {
                self.mode = WptCtrlMode::Tracking;
                info!(
                    "WptCtrl tracking to {} (offset {:?})",
                    self.goal.unwrap_or(self.params.goal_pose),
                    self.prev_offset
                );
            }
            Err(e) => self.fail(e),
        }
    }

    fn update(&mut self) -> StatusReport {
        let mut report = StatusReport {
            mode: self.mode,
            elapsed_s: self.timer.get(),
            replanned: false,
            replan_start_vel_ms: None,
            errors: TrackingErrors::default(),
            wheel_states_emitted: false,
            wheel_speed_limited: false,
            at_reference: false,
        };

        match self.mode {
            WptCtrlMode::Idle | WptCtrlMode::Failed => return report,
            WptCtrlMode::Tracking | WptCtrlMode::Replanning => (),
        }

        let offset = self.collab.offset_source.get_offset();
        if offset != self.prev_offset {
            match self.replan(offset) {
                Ok(v) => {
                    report.replanned = true;
                    report.replan_start_vel_ms = Some(v);
                }
                Err(e) => {
                    self.fail(e);
                    report.mode = self.mode;
                    return report;
                }
            }
        }

        self.track(&mut report);
        report.mode = self.mode;

        report
    }

    /// Only ever done if trajectory generation failed, otherwise the final
    /// state of the trajectory is held until stopped.
    fn is_done(&self) -> bool {
        self.mode == WptCtrlMode::Failed
    }

    fn stop(&mut self) {
        self.timer.stop();
        info!("WptCtrl stopped at {:.3} s", self.timer.get());
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        loco_ctrl::{WheelState, NUM_MODULES},
        traj_ctrl::{PidParams, ProfiledPidParams},
        traj_gen::TrajConfig,
        wpt_ctrl::{GoalOffsetSource, Gyro, PoseSource, TickObserver, WheelStateSink},
    };
    use std::{
        cell::{Cell, RefCell},
        f64::consts::PI,
        rc::Rc,
    };
    use util::time::ManualTime;

    const PERIOD_S: f64 = 0.02;

    struct SharedPose(Rc<Cell<Pose>>);
    struct NoGyro;
    struct SharedOffset(Rc<Cell<GoalOffset>>);
    struct Recorder(Rc<RefCell<Vec<[WheelState; NUM_MODULES]>>>);
    struct TrajRecorder(Rc<RefCell<Vec<Trajectory>>>);

    impl PoseSource for SharedPose {
        fn get_pose(&self) -> Pose {
            self.0.get()
        }
    }

    impl Gyro for NoGyro {
        fn get_rate_correction(&self) -> f64 {
            0.0
        }
    }

    impl GoalOffsetSource for SharedOffset {
        fn get_offset(&self) -> GoalOffset {
            self.0.get()
        }
    }

    impl WheelStateSink for Recorder {
        fn apply_wheel_states(&mut self, states: &[WheelState; NUM_MODULES]) {
            self.0.borrow_mut().push(*states);
        }
    }

    impl TickObserver for TrajRecorder {
        fn on_trajectory(&mut self, trajectory: &Trajectory) {
            self.0.borrow_mut().push(trajectory.clone());
        }
    }

    struct Harness {
        ctrl: WptCtrl,
        time: ManualTime,
        pose: Rc<Cell<Pose>>,
        offset: Rc<Cell<GoalOffset>>,
        emitted: Rc<RefCell<Vec<[WheelState; NUM_MODULES]>>>,
        trajectories: Rc<RefCell<Vec<Trajectory>>>,
    }

    impl Harness {
        fn new(goal_pose: Pose, start_pose: Pose) -> Self {
            let time = ManualTime::new(0.0);
            let pose = Rc::new(Cell::new(start_pose));
            let offset = Rc::new(Cell::new(GoalOffset::Center));
            let emitted = Rc::new(RefCell::new(Vec::new()));
            let trajectories = Rc::new(RefCell::new(Vec::new()));

            let mut theta = PidParams::new(1.3, 0.0, 0.0);
            theta.tolerance = PI / 180.0;
            let mut x_ctrl = PidParams::new(1.0, 0.0, 0.0);
            x_ctrl.integrator_range = [-0.3, 0.3];
            let mut y_ctrl = PidParams::new(0.7, 0.0, 0.0);
            y_ctrl.integrator_range = [-0.3, 0.3];

            let ctrl = WptCtrl::new(
                Params {
                    goal_pose,
                    y_offset_m: 0.5,
                    traj: TrajConfig::new(5.0, 2.0),
                },
                &traj_ctrl::Params {
                    period_s: PERIOD_S,
                    x_ctrl,
                    y_ctrl,
                    theta_ctrl: ProfiledPidParams {
                        pid: theta,
                        max_vel_rads: 6.0,
                        max_accel_radss: 12.0,
                    },
                },
                loco_ctrl::Params {
                    module_pos_m_rb: [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]],
                    max_wheel_speed_ms: 4.5,
                },
                Collaborators {
                    pose_source: Box::new(SharedPose(pose.clone())),
                    gyro: Box::new(NoGyro),
                    offset_source: Box::new(SharedOffset(offset.clone())),
                    sink: Box::new(Recorder(emitted.clone())),
                    observer: Some(Box::new(TrajRecorder(trajectories.clone()))),
                },
                time.clone(),
            )
            .unwrap();

            Self {
                ctrl,
                time,
                pose,
                offset,
                emitted,
                trajectories,
            }
        }

        fn tick(&mut self) -> StatusReport {
            self.time.advance(PERIOD_S);
            self.ctrl.update()
        }
    }

    #[test]
    fn test_idle_emits_nothing() {
        let mut h = Harness::new(Pose::new(3.0, 0.0, 0.0), Pose::default());

        let report = h.tick();
        assert_eq!(report.mode, WptCtrlMode::Idle);
        assert!(!report.wheel_states_emitted);
        assert!(h.emitted.borrow().is_empty());
        assert!(!h.ctrl.is_done());
    }

    #[test]
    fn test_track() {
        let goal = Pose::new(3.0, 0.0, 0.0);
        let mut h = Harness::new(goal, Pose::default());

        h.ctrl.start();
        assert_eq!(h.ctrl.mode(), WptCtrlMode::Tracking);

        let traj = h.ctrl.trajectory().unwrap();
        assert!(traj.duration_s() > 0.0);
        assert!(traj.sample(traj.duration_s()).pose.distance_to(&goal) < 1e-3);

        for _ in 0..5 {
            let report = h.tick();
            assert_eq!(report.mode, WptCtrlMode::Tracking);
            assert!(report.wheel_states_emitted);
            assert!(!report.replanned);
        }

        assert_eq!(h.emitted.borrow().len(), 5);
        assert_eq!(h.trajectories.borrow().len(), 1);

        // Vehicle has not moved, so the controller pushes it forwards
        let last = h.emitted.borrow()[4];
        for s in last.iter() {
            assert!(s.speed_ms > 0.0);
            assert!(s.angle_rad.abs() < 1e-9);
        }
    }

    #[test]
    fn test_replan_on_offset_change() {
        let goal = Pose::new(3.0, 0.0, 0.0);
        let mut h = Harness::new(goal, Pose::default());

        h.ctrl.start();

        for _ in 0..9 {
            h.tick();
        }

        // Change the offset before the tenth tick
        let old_traj = h.ctrl.trajectory().unwrap().clone();
        h.offset.set(GoalOffset::Left);
        h.time.advance(PERIOD_S);
        let expected_vel_ms = old_traj.sample(h.ctrl.elapsed_s()).vel_ms.abs();
        let report = h.ctrl.update();

        assert!(report.replanned);
        assert_eq!(report.mode, WptCtrlMode::Tracking);
        assert!(report.wheel_states_emitted);
        assert_eq!(report.elapsed_s, 0.0);
        assert_eq!(h.ctrl.elapsed_s(), 0.0);

        let start_vel_ms = report.replan_start_vel_ms.unwrap();
        assert!(expected_vel_ms > 0.0);
        assert!((start_vel_ms - expected_vel_ms).abs() < 1e-6);

        let new_traj = h.ctrl.trajectory().unwrap();
        assert!((new_traj.start().vel_ms - expected_vel_ms).abs() < 1e-6);
        assert!((new_traj.end().pose.y() + 0.5).abs() < 1e-12);
        assert!((h.ctrl.goal().unwrap().y() + 0.5).abs() < 1e-12);
        assert_eq!(h.trajectories.borrow().len(), 2);

        // Same offset on the next tick doesn't replan
        assert!(!h.tick().replanned);
        assert_eq!(h.trajectories.borrow().len(), 2);
    }

    #[test]
    fn test_hold_at_goal() {
        // Starting at the goal gives a stationary trajectory, so holding the
        // vehicle at the reference should never move the wheels.
        let goal = Pose::new(1.0, 2.0, 0.4);
        let mut h = Harness::new(goal, goal);

        h.ctrl.start();
        assert_eq!(h.ctrl.trajectory().unwrap().duration_s(), 0.0);

        for _ in 0..20 {
            let report = h.tick();
            assert!(report.wheel_states_emitted);
        }

        for states in h.emitted.borrow().iter() {
            for s in states.iter() {
                assert_eq!(s.speed_ms, 0.0);
            }
        }
    }

    #[test]
    fn test_failed() {
        let mut h = Harness::new(Pose::new(3.0, 0.0, 0.0), Pose::new(f64::NAN, 0.0, 0.0));

        h.ctrl.start();
        assert_eq!(h.ctrl.mode(), WptCtrlMode::Failed);
        assert!(h.ctrl.is_done());

        for _ in 0..3 {
            let report = h.tick();
            assert_eq!(report.mode, WptCtrlMode::Failed);
            assert!(!report.wheel_states_emitted);
        }
        assert!(h.emitted.borrow().is_empty());

        // Restarting from a valid pose recovers
        h.pose.set(Pose::default());
        h.ctrl.start();
        assert_eq!(h.ctrl.mode(), WptCtrlMode::Tracking);
        assert!(!h.ctrl.is_done());
    }

    #[test]
    fn test_failed_replan() {
        let mut h = Harness::new(Pose::new(3.0, 0.0, 0.0), Pose::default());

        h.ctrl.start();
        for _ in 0..10 {
            h.tick();
        }

        h.pose.set(Pose::new(f64::NAN, 0.0, 0.0));
        h.offset.set(GoalOffset::Right);

        let report = h.tick();
        assert_eq!(report.mode, WptCtrlMode::Failed);
        assert!(!report.wheel_states_emitted);
        assert_eq!(h.emitted.borrow().len(), 10);
        assert!(h.ctrl.is_done());
    }

    #[test]
    fn test_stop() {
        let mut h = Harness::new(Pose::new(3.0, 0.0, 0.0), Pose::default());

        h.ctrl.start();
        h.tick();
        h.ctrl.stop();

        let held_s = h.ctrl.elapsed_s();
        h.time.advance(1.0);
        assert_eq!(h.ctrl.elapsed_s(), held_s);
        assert_eq!(h.ctrl.mode(), WptCtrlMode::Tracking);
        assert!(h.ctrl.trajectory().is_some());
    }
}
