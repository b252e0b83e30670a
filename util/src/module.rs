//! Module interfaces
//!
//! Modules in `swerve_exec` which are driven by the fixed-period main loop
//! shall implement the items in this module.

// ---------------------------------------------------------------------------
// PERIODIC TASK
// ---------------------------------------------------------------------------

/// A task executed once per cycle of a fixed-period scheduler.
///
/// The scheduler calls `start` once when the task becomes active, `update`
/// once per cycle while it is active, and `stop` when it is released. The 
/// task may ask to be released early by returning `true` from `is_done`.
/// At most one call is ever in flight for a given task.
pub trait PeriodicTask {
    /// A report on the status of the cyclic processing.
    type StatusReport;

    /// Activate the task.
    fn start(&mut self);

    /// Main cyclic processing function.
    ///
    /// # Outputs
    /// - A report on the processing performed in this cycle.
    fn update(&mut self) -> Self::StatusReport;

    /// Returns `true` once the task has nothing more to do.
    fn is_done(&self) -> bool;

    /// Deactivate the task.
    fn stop(&mut self);
}
