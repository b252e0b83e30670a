//! # Swerve executable
//!
//! Runs waypoint control in closed loop against the simulated swerve chassis. The goal pose,
//! controller tuning, chassis geometry and the scripted goal offset changes are all read from the
//! parameter files.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    thread,
    time::{Duration, Instant},
};

use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use serde::Serialize;

use swerve_lib::{
    loco_ctrl::{self, SwerveKinematics},
    sim::{self, SimRobot},
    traj_ctrl,
    traj_gen::Trajectory,
    wpt_ctrl::{
        self, Collaborators, LogObserver, StatusReport, TickObserver, TickSnapshot, WptCtrl,
        WptCtrlMode,
    },
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    logger::{logger_init, LevelFilter},
    module::PeriodicTask,
    session::{self, Session},
    time::ManualTime,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Observer archiving each tracking cycle to CSV and each trajectory to JSON, as well as logging
/// them.
struct ArchiveObserver {
    log: LogObserver,

    arch_tick: Archiver,

    /// Record waiting to be written
    pending: Option<TickRecord>,
}

/// A single tracking cycle, flattened for CSV.
#[derive(Serialize)]
struct TickRecord {
    time_s: f64,
    elapsed_s: f64,
    meas_x_m: f64,
    meas_y_m: f64,
    meas_head_rad: f64,
    des_x_m: f64,
    des_y_m: f64,
    des_head_rad: f64,
    des_vel_ms: f64,
    target_head_rad: f64,
    x_error_m: f64,
    y_error_m: f64,
    head_error_rad: f64,
    vx_ms: f64,
    vy_ms: f64,
    omega_rads: f64,
    fl_speed_ms: f64,
    fl_angle_rad: f64,
    fr_speed_ms: f64,
    fr_angle_rad: f64,
    rl_speed_ms: f64,
    rl_angle_rad: f64,
    rr_speed_ms: f64,
    rr_angle_rad: f64,
}

/// The status report of a cycle, flattened for CSV.
#[derive(Serialize)]
struct StatusRecord {
    time_s: f64,
    cycle: u64,
    mode: WptCtrlMode,
    elapsed_s: f64,
    replanned: bool,
    replan_start_vel_ms: Option<f64>,
    wheel_states_emitted: bool,
    wheel_speed_limited: bool,
    at_reference: bool,
    x_error_m: f64,
    y_error_m: f64,
    head_error_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("swerve_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, tracing only the state machine
    logger_init(
        LevelFilter::Debug,
        &[("swerve_lib::wpt_ctrl", LevelFilter::Trace)],
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Waypoint Tracking\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let loco_ctrl_params: loco_ctrl::Params =
        util::params::load("loco_ctrl.toml").wrap_err("Could not load loco_ctrl params")?;
    let traj_ctrl_params: traj_ctrl::Params =
        util::params::load("traj_ctrl.toml").wrap_err("Could not load traj_ctrl params")?;
    let wpt_ctrl_params: wpt_ctrl::Params =
        util::params::load("wpt_ctrl.toml").wrap_err("Could not load wpt_ctrl params")?;
    let sim_params: sim::Params =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    let run_duration_s = sim_params.run_duration_s;
    let realtime = sim_params.realtime;

    // ---- MODULE INIT ----

    let sim_kinematics = SwerveKinematics::new(loco_ctrl_params.clone())
        .wrap_err("Failed to initialise the simulated chassis kinematics")?;
    let sim = SimRobot::new(sim_params, sim_kinematics).into_handle();
    info!("Simulation init complete, starting at {}", sim.pose());

    let time = ManualTime::new(0.0);

    let archive = ArchiveObserver::new(&session).wrap_err("Failed to initialise archiving")?;
    let mut arch_status = Archiver::from_path(&session, "wpt_ctrl/status_report.csv")
        .wrap_err("Failed to initialise the status report archive")?;

    let mut wpt_ctrl = WptCtrl::new(
        wpt_ctrl_params,
        &traj_ctrl_params,
        loco_ctrl_params,
        Collaborators {
            pose_source: Box::new(sim.clone()),
            gyro: Box::new(sim.clone()),
            offset_source: Box::new(sim.clone()),
            sink: Box::new(sim.clone()),
            observer: Some(Box::new(archive)),
        },
        time.clone(),
    )
    .wrap_err("Failed to initialise WptCtrl")?;
    info!("WptCtrl init complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    wpt_ctrl.start();

    let mut num_cycles = 0u64;
    let mut num_consec_cycle_overruns = 0u64;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- WAYPOINT CONTROL ----

        let report = wpt_ctrl.update();

        if report.replanned {
            info!(
                "Replanned at {:.2} s towards {:?}",
                sim.time_s(),
                wpt_ctrl.goal()
            );
        }

        if let Err(e) = arch_status.serialise(StatusRecord::new(num_cycles, &report)) {
            warn!("Could not archive the status report: {}", e);
        }

        if wpt_ctrl.is_done() {
            warn!("WptCtrl failed, exiting");
            break;
        }

        // ---- SIMULATION PROCESSING ----

        sim.step(CYCLE_PERIOD_S);
        time.advance(CYCLE_PERIOD_S);

        // Increment cycle counter
        num_cycles += 1;

        if sim.time_s() >= run_duration_s {
            info!("Run duration of {:.2} s reached, exiting", run_duration_s);
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        if !realtime {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                num_consec_cycle_overruns += 1;
                warn!(
                    "Cycle overran by {:.06} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S,
                    num_consec_cycle_overruns
                );
            }
        }
    }

    wpt_ctrl.stop();

    info!(
        "Finished after {} cycles, final pose {}, goal {:?}",
        num_cycles,
        sim.pose(),
        wpt_ctrl.goal()
    );

    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ArchiveObserver {
    fn new(session: &Session) -> Result<Self, ArchiveError> {
        Ok(Self {
            log: LogObserver,
            arch_tick: Archiver::from_path(session, "wpt_ctrl/tick.csv")?,
            pending: None,
        })
    }
}

impl Archived for ArchiveObserver {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.pending.take() {
            Some(r) => self.arch_tick.serialise(r),
            None => Ok(()),
        }
    }
}

impl TickObserver for ArchiveObserver {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        self.log.on_tick(snapshot);
        self.pending = Some(TickRecord::from(snapshot));

        if let Err(e) = self.write() {
            warn!("Could not archive the tick: {}", e);
        }
    }

    fn on_trajectory(&mut self, trajectory: &Trajectory) {
        self.log.on_trajectory(trajectory);
        session::save_with_timestamp("traj/trajectory.json", trajectory.clone());
    }
}

impl From<&TickSnapshot> for TickRecord {
    fn from(s: &TickSnapshot) -> Self {
        let w = &s.wheel_states;

        Self {
            time_s: session::get_elapsed_seconds(),
            elapsed_s: s.elapsed_s,
            meas_x_m: s.measured_pose.x(),
            meas_y_m: s.measured_pose.y(),
            meas_head_rad: s.measured_pose.heading_rad,
            des_x_m: s.desired.pose.x(),
            des_y_m: s.desired.pose.y(),
            des_head_rad: s.desired.pose.heading_rad,
            des_vel_ms: s.desired.vel_ms,
            target_head_rad: s.desired_heading_rad,
            x_error_m: s.errors.x_error_m,
            y_error_m: s.errors.y_error_m,
            head_error_rad: s.errors.head_error_rad,
            vx_ms: s.chassis_vel.vx_ms,
            vy_ms: s.chassis_vel.vy_ms,
            omega_rads: s.chassis_vel.omega_rads,
            fl_speed_ms: w[0].speed_ms,
            fl_angle_rad: w[0].angle_rad,
            fr_speed_ms: w[1].speed_ms,
            fr_angle_rad: w[1].angle_rad,
            rl_speed_ms: w[2].speed_ms,
            rl_angle_rad: w[2].angle_rad,
            rr_speed_ms: w[3].speed_ms,
            rr_angle_rad: w[3].angle_rad,
        }
    }
}

impl StatusRecord {
    fn new(cycle: u64, report: &StatusReport) -> Self {
        Self {
            time_s: session::get_elapsed_seconds(),
            cycle,
            mode: report.mode,
            elapsed_s: report.elapsed_s,
            replanned: report.replanned,
            replan_start_vel_ms: report.replan_start_vel_ms,
            wheel_states_emitted: report.wheel_states_emitted,
            wheel_speed_limited: report.wheel_speed_limited,
            at_reference: report.at_reference,
            x_error_m: report.errors.x_error_m,
            y_error_m: report.errors.y_error_m,
            head_error_rad: report.errors.head_error_rad,
        }
    }
}
