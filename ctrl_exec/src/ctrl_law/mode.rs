//! Control law modes and their transitions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Operating mode of the control law.
///
/// Modes only move forward: `NotStarted -> Moving -> Stopping -> Ended`. `Stopping` may also be
/// entered directly from `NotStarted` if the vehicle starts inside the final stop distance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// No driving throttle has been computed yet.
    NotStarted,

    /// The vehicle is being driven along the mission.
    Moving,

    /// The final goal has been reached, throttle is cut.
    Stopping,

    /// The mission is over, no further commands are issued.
    Ended,
}

/// Events which can change the mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    /// A driving (non kick-start, non stop) throttle was computed.
    ThrottleEngaged,

    /// The vehicle came within the final stop distance of a final stop goal.
    FinalStopReached,

    /// A tick ran while stopping.
    StopTick,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Mode {
    /// The mode that follows this one when `event` occurs.
    pub fn next(self, event: ModeEvent) -> Mode {
        use Mode::*;
        use ModeEvent::*;

        match (self, event) {
            (NotStarted, ThrottleEngaged) => Moving,
            (NotStarted, FinalStopReached) | (Moving, FinalStopReached) => Stopping,
            (Stopping, StopTick) => Ended,
            (mode, _) => mode,
        }
    }

    /// True while stopping or ended.
    pub fn is_stopping(&self) -> bool {
        matches!(self, Mode::Stopping | Mode::Ended)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::NotStarted
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transitions() {
        use Mode::*;
        use ModeEvent::*;

        assert_eq!(NotStarted.next(ThrottleEngaged), Moving);
        assert_eq!(NotStarted.next(FinalStopReached), Stopping);
        assert_eq!(NotStarted.next(StopTick), NotStarted);

        assert_eq!(Moving.next(ThrottleEngaged), Moving);
        assert_eq!(Moving.next(FinalStopReached), Stopping);
        assert_eq!(Moving.next(StopTick), Moving);

        // Stopping is irreversible
        assert_eq!(Stopping.next(ThrottleEngaged), Stopping);
        assert_eq!(Stopping.next(FinalStopReached), Stopping);
        assert_eq!(Stopping.next(StopTick), Ended);

        // Ended is terminal
        for e in &[ThrottleEngaged, FinalStopReached, StopTick] {
            assert_eq!(Ended.next(*e), Ended);
        }
    }
}
