//! # Odometry ingest
//!
//! Odometry samples arrive at an irregular rate. The ingest keeps two running timers, the time
//! since the last control tick and the total mission time, and decides when a control tick is
//! due.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use util::maths::rel_error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sample timing and tick scheduling.
#[derive(Debug, Clone)]
pub struct OdomIngest {
    /// Target period between control ticks.
    ///
    /// Units: seconds
    period_s: f64,

    /// Relative tolerance on the period inside which a tick fires early.
    tolerance: f64,

    /// Timestamp of the previous sample, `None` before the first sample.
    prev_timestamp_s: Option<f64>,

    since_last_tick_s: f64,

    mission_elapsed_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What absorbing a sample means for the timers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SampleTiming {
    /// This was the first sample, the timers were started and a tick must fire at time zero.
    Bootstrap,

    /// The timers advanced by the given step.
    Advanced { dt_s: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OdomIngest {
    pub fn new(period_s: f64, tolerance: f64) -> Self {
        Self {
            period_s,
            tolerance,
            prev_timestamp_s: None,
            since_last_tick_s: 0.0,
            mission_elapsed_s: 0.0,
        }
    }

    /// Absorb the timestamp of a new sample, advancing both timers.
    ///
    /// Out of order samples do not move the timers backwards, their step is taken as zero and the
    /// previous timestamp is kept.
    pub fn absorb(&mut self, timestamp_s: f64) -> SampleTiming {
        let prev_s = match self.prev_timestamp_s {
            Some(t) => t,
            None => {
                info!(
                    "Starting control loop with polling period: {:.2} s",
                    self.period_s
                );
                self.prev_timestamp_s = Some(timestamp_s);
                return SampleTiming::Bootstrap;
            }
        };

        let dt_s = timestamp_s - prev_s;
        if dt_s < 0.0 {
            warn!(
                "Odometry sample is {:.4} s older than the previous one, ignoring its step",
                -dt_s
            );
            return SampleTiming::Advanced { dt_s: 0.0 };
        }

        self.since_last_tick_s += dt_s;
        self.mission_elapsed_s += dt_s;
        self.prev_timestamp_s = Some(timestamp_s);

        SampleTiming::Advanced { dt_s }
    }

    /// Decide whether a control tick is due, resetting the tick timer if it is.
    ///
    /// A tick fires once the time since the last tick is within the relative tolerance of the
    /// period, or has overrun it.
    pub fn tick_due(&mut self) -> bool {
        let due = rel_error(self.since_last_tick_s, self.period_s) < self.tolerance
            || self.since_last_tick_s > self.period_s;

        if due {
            self.since_last_tick_s = 0.0;
        }

        due
    }

    /// Total time since the first sample.
    pub fn mission_elapsed_s(&self) -> f64 {
        self.mission_elapsed_s
    }

    pub fn since_last_tick_s(&self) -> f64 {
        self.since_last_tick_s
    }

    pub fn started(&self) -> bool {
        self.prev_timestamp_s.is_some()
    }
}
