//! Control law engine state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{Mode, ModeEvent, Params};
use crate::{cmd_publisher::CommandPublisher, mission::GoalType};
use comms_if::cmd::Gear;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Computes gear, throttle and steering demands each control tick.
pub struct ControlLawEngine {
    params: Params,

    state: ControlState,
}

/// The engine's persistent state, created once per mission.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ControlState {
    pub mode: Mode,

    /// Current throttle demand.
    pub throttle: f64,

    /// Current steering demand in the controller's sign convention.
    ///
    /// Units: radians
    pub steering_rad: f64,

    /// Last gear sent to the publisher.
    pub published_gear: Gear,

    /// Last throttle sent to the publisher.
    pub published_throttle: f64,

    /// Number of consecutive ticks spent settled on the same goal type.
    pub settle_count: u32,

    /// Goal type the settle counter refers to.
    pub settled_goal_type: Option<GoalType>,

    /// Set once a driving throttle has been computed. Until then gear and throttle are published
    /// every tick.
    pub throttle_engaged: bool,

    /// Mission time at which the engine ended.
    ///
    /// Units: seconds
    pub ended_at_s: Option<f64>,
}

/// Inputs to a single control tick.
#[derive(Debug, Copy, Clone)]
pub struct TickInput {
    /// Active goal in the vehicle frame.
    ///
    /// Units: meters
    pub local_goal_m: Vector2<f64>,

    /// Units: meters/second
    pub speed_ms: f64,

    pub goal_type: GoalType,
}

/// Summary of a control tick.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct TickReport {
    /// Planar distance to the active goal.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Units: meters/second
    pub speed_ms: f64,

    pub goal_type: GoalType,

    pub gear: Gear,

    pub throttle: f64,

    /// Units: radians
    pub steering_rad: f64,

    pub settle_count: u32,

    /// True if the steering demand was recalculated on this tick.
    pub steering_recomputed: bool,

    /// True if the steering demand was published on this tick.
    pub steering_published: bool,

    /// Mode at the end of the tick.
    pub mode: Mode,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlLawEngine {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            state: ControlState::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Consume the tick if the engine is stopping or has ended.
    ///
    /// The first tick after stopping logs the total mission time and ends the engine. Returns
    /// `true` if the tick was consumed, in which case no commands may be issued for it.
    pub fn end_if_stopping(&mut self, elapsed_s: f64) -> bool {
        match self.state.mode {
            Mode::Stopping => {
                info!("Controller time: {:.4} s", elapsed_s);
                self.state.mode = self.state.mode.next(ModeEvent::StopTick);
                self.state.ended_at_s = Some(elapsed_s);
                true
            }
            Mode::Ended => true,
            Mode::NotStarted | Mode::Moving => false,
        }
    }

    /// Run the control law for one tick, publishing any commands that need sending.
    ///
    /// The caller must have checked `end_if_stopping` first.
    pub fn step<P>(&mut self, input: &TickInput, publisher: &mut P) -> TickReport
    where
        P: CommandPublisher + ?Sized,
    {
        let p = &self.params;
        let s = &mut self.state;

        let distance_m = input.local_goal_m.norm();

        // ---- SETTLE DETECTION ----

        if s.steering_rad.abs() <= p.settle_threshold_rad
            && s.settled_goal_type == Some(input.goal_type)
        {
            s.settle_count += 1;
        } else {
            s.settle_count = 0;
            s.settled_goal_type = Some(input.goal_type);
        }

        let cadence_open = settle_gate_open(s.settle_count, p.settle_window);

        // ---- STEERING ----

        let steering_recomputed = input.speed_ms > p.steering_min_speed_ms && cadence_open;

        if steering_recomputed {
            let alpha_rad = input.local_goal_m[1].atan2(input.local_goal_m[0]);
            let omega = p.steering_gain * alpha_rad;

            // Goal dead ahead gives an infinite turn radius, keep the previous steering
            if omega != 0.0 {
                let turn_radius_m = input.speed_ms / -omega;
                s.steering_rad = (p.wheelbase_m / turn_radius_m).atan();
            }
        }

        // ---- GEAR AND STOP ----

        let gear = input.goal_type.gear();

        if input.goal_type == GoalType::FinalStop && distance_m < p.final_stop_distance_m {
            s.mode = s.mode.next(ModeEvent::FinalStopReached);
        }

        // ---- THROTTLE ----

        if input.speed_ms < p.kick_start_speed_ms {
            s.throttle = p.kick_start_throttle;
        } else if !s.mode.is_stopping() {
            s.mode = s.mode.next(ModeEvent::ThrottleEngaged);
            s.throttle_engaged = true;

            if !input.goal_type.is_stop_and_go() {
                if input.speed_ms < p.base_throttle_speed_ms {
                    s.throttle = p.base_throttle;
                } else if s.throttle < p.throttle_ramp_cap {
                    s.throttle += p.throttle_ramp_step;
                }
            } else if distance_m < p.stop_and_go_distance_m
                && s.throttle > p.stop_and_go_min_throttle
            {
                s.throttle -= p.stop_and_go_decay_step;
            }
        } else {
            s.throttle = 0.0;
        }

        s.steering_rad = clamp_abs(s.steering_rad, p.max_steering_rad);

        // ---- PUBLISH ----

        // Until the vehicle is driving, resend gear and throttle every tick so the actuators
        // receive them whenever they start accepting commands.
        if !s.throttle_engaged || gear != s.published_gear {
            publisher.set_gear(gear);
            s.published_gear = gear;
        }
        if !s.throttle_engaged || s.throttle != s.published_throttle {
            publisher.set_throttle(s.throttle);
            s.published_throttle = s.throttle;
        }

        // The actuator steers with the opposite sign to the controller
        if cadence_open {
            publisher.set_steering(-s.steering_rad);
        }

        let report = TickReport {
            distance_m,
            speed_ms: input.speed_ms,
            goal_type: input.goal_type,
            gear,
            throttle: s.throttle,
            steering_rad: s.steering_rad,
            settle_count: s.settle_count,
            steering_recomputed,
            steering_published: cadence_open,
            mode: s.mode,
        };

        trace!("{:?}", report);

        report
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// True if the settle counter allows steering to be updated on this tick.
///
/// Steering is updated every tick for the first `window` ticks after a goal type change, then once
/// every `window` ticks. A zero window never gates.
pub fn settle_gate_open(settle_count: u32, window: u32) -> bool {
    settle_count <= window
        || (settle_count - window)
            .checked_rem(window)
            .map_or(true, |r| r == 0)
}
