//! # Vehicle commands
//!
//! The controller drives the vehicle through three independent channels: gear, throttle and
//! steering. Each command is sent as its own message, so a channel is only written when the
//! controller decides it needs updating.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Direction of travel selected on the gearbox.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gear {
    Forward,
    Reverse,
}

/// A command on one of the vehicle's actuator channels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum VehicleCmd {
    /// Select the gear.
    Gear(Gear),

    /// Set the throttle demand, between 0 and 1.
    Throttle(f64),

    /// Set the steering demand in the actuator's sign convention.
    ///
    /// Units: radians
    Steering(f64),
}

impl Default for Gear {
    fn default() -> Self {
        Gear::Forward
    }
}
