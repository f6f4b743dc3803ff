//! # Control law module
//!
//! The control law turns the active goal, expressed in the vehicle frame, into gear, throttle and
//! steering demands for a car-like vehicle.
//!
//! Steering follows an Ackermann bicycle model. The bearing to the goal is treated as a turn rate
//! demand, which together with the current speed gives a turn radius and so a steering angle for
//! the vehicle's wheelbase. Once the steering has stayed small for a while on the same type of goal
//! the vehicle is considered settled and steering is only recalculated every few ticks, which
//! keeps the vehicle from weaving on straights.
//!
//! Throttle is chosen by a small rule set: kick-start a stationary vehicle, hold a base throttle at
//! low speed, ramp slowly up to a cap, and ease off when approaching a stop-and-go goal. Reaching
//! the final goal cuts the throttle and ends the mission on the following tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod mode;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use mode::*;
pub use params::Params;
pub use state::*;
