//! Control law parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control law, loaded from `ctrl.toml`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    // ---- SCHEDULING ----
    /// Target period between control ticks.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Relative tolerance on the period inside which a tick may fire early.
    pub period_tolerance: f64,

    // ---- GEOMETRY ----
    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    // ---- STEERING ----
    /// Gain between the bearing to the goal and the demanded turn rate.
    pub steering_gain: f64,

    /// Maximum steering magnitude.
    ///
    /// Units: radians
    pub max_steering_rad: f64,

    /// Steering magnitude below which the vehicle is considered settled on a goal.
    ///
    /// Units: radians
    pub settle_threshold_rad: f64,

    /// Number of ticks after a goal type change during which steering is recomputed every tick.
    /// Past this window steering is recomputed once every `settle_window` ticks.
    pub settle_window: u32,

    /// Speed above which steering is recomputed.
    ///
    /// Units: meters/second
    pub steering_min_speed_ms: f64,

    // ---- THROTTLE ----
    /// Speed below which the kick-start throttle is applied.
    ///
    /// Units: meters/second
    pub kick_start_speed_ms: f64,

    /// Throttle applied to get a stationary vehicle moving.
    pub kick_start_throttle: f64,

    /// Speed below which the base throttle is applied.
    ///
    /// Units: meters/second
    pub base_throttle_speed_ms: f64,

    /// Throttle applied at low speeds.
    pub base_throttle: f64,

    /// Throttle increment per tick above the base throttle speed.
    pub throttle_ramp_step: f64,

    /// Throttle above which the ramp stops incrementing.
    pub throttle_ramp_cap: f64,

    /// Distance to a stop-and-go goal inside which the throttle decays.
    ///
    /// Units: meters
    pub stop_and_go_distance_m: f64,

    /// Throttle decrement per tick on a stop-and-go approach.
    pub stop_and_go_decay_step: f64,

    /// Throttle above which the stop-and-go decay is applied.
    pub stop_and_go_min_throttle: f64,

    // ---- STOPPING ----
    /// Planar distance to the final goal inside which the vehicle stops.
    ///
    /// Units: meters
    pub final_stop_distance_m: f64,

    // ---- FRAME TRANSFORM ----
    /// Delay between frame transform attempts.
    ///
    /// Units: seconds
    pub transform_retry_delay_s: f64,

    /// Time after which an unavailable frame transform is reported as an error.
    ///
    /// Units: seconds
    pub transform_timeout_s: f64,

    // ---- STARTUP ----
    /// Time to wait for the first odometry sample before giving up.
    ///
    /// Units: seconds
    pub first_sample_timeout_s: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            period_s: 0.2,
            period_tolerance: 0.05,
            wheelbase_m: 2.9,
            steering_gain: 1.0,
            max_steering_rad: 0.6,
            settle_threshold_rad: 0.2,
            settle_window: 10,
            steering_min_speed_ms: 1.0,
            kick_start_speed_ms: 0.5,
            kick_start_throttle: 0.5,
            base_throttle_speed_ms: 2.0,
            base_throttle: 0.35,
            throttle_ramp_step: 0.005,
            throttle_ramp_cap: 0.49,
            stop_and_go_distance_m: 20.0,
            stop_and_go_decay_step: 0.02,
            stop_and_go_min_throttle: 0.1,
            final_stop_distance_m: 3.0,
            transform_retry_delay_s: 0.001,
            transform_timeout_s: 1.0,
            first_sample_timeout_s: 20.0,
        }
    }
}
