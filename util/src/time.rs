//! General time utility functions
//!
//! Alongside the conversion helpers this module provides the [`Timer`] used
//! by periodic tasks to measure elapsed time. A timer reads time from a
//! [`TimeSource`], which is either the host's monotonic clock or a manually
//! advanced clock used for simulation and testing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of monotonically increasing time.
pub trait TimeSource {
    /// Current time in seconds from an arbitrary, fixed, origin.
    fn now_s(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Time source backed by the host's monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant
}

/// Time source which only moves when explicitly advanced.
///
/// Clones share the same underlying time, so one handle can be given to a
/// timer while another is used to step the simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now_s: Rc<Cell<f64>>
}

/// A stopwatch style timer.
///
/// While running the elapsed time is the time accumulated before the last
/// stop plus the time since the last start. A stopped timer holds its value.
pub struct Timer {
    source: Box<dyn TimeSource>,

    /// Time at which the timer was last started, `None` if stopped.
    start_time_s: Option<f64>,

    /// Time accumulated before the last stop.
    accumulated_s: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now()
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl ManualTime {
    pub fn new(start_s: f64) -> Self {
        Self {
            now_s: Rc::new(Cell::new(start_s))
        }
    }

    /// Move time forward by the given number of seconds.
    pub fn advance(&self, dt_s: f64) {
        self.now_s.set(self.now_s.get() + dt_s);
    }

    pub fn set(&self, now_s: f64) {
        self.now_s.set(now_s);
    }
}

impl TimeSource for ManualTime {
    fn now_s(&self) -> f64 {
        self.now_s.get()
    }
}

impl Timer {
    /// Create a new, stopped, timer reading from the given source.
    pub fn new<S: TimeSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            start_time_s: None,
            accumulated_s: 0.0
        }
    }

    /// Start the timer if it is not already running.
    pub fn start(&mut self) {
        if self.start_time_s.is_none() {
            self.start_time_s = Some(self.source.now_s());
        }
    }

    /// Stop the timer, holding the current elapsed time.
    pub fn stop(&mut self) {
        self.accumulated_s = self.get();
        self.start_time_s = None;
    }

    /// Reset the elapsed time to zero without changing whether the timer is
    /// running.
    pub fn reset(&mut self) {
        self.accumulated_s = 0.0;
        if self.start_time_s.is_some() {
            self.start_time_s = Some(self.source.now_s());
        }
    }

    /// Reset the elapsed time to zero and start the timer.
    pub fn restart(&mut self) {
        self.accumulated_s = 0.0;
        self.start_time_s = Some(self.source.now_s());
    }

    /// Get the elapsed time in seconds.
    pub fn get(&self) -> f64 {
        match self.start_time_s {
            Some(t0) => self.accumulated_s + (self.source.now_s() - t0),
            None => self.accumulated_s
        }
    }

    pub fn is_running(&self) -> bool {
        self.start_time_s.is_some()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
