//! # Odometry samples
//!
//! The vehicle interface publishes one [`OdomSample`] per odometry update. Samples arrive at an
//! irregular rate and are treated as ground truth.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single pose and velocity sample of the vehicle in the map frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OdomSample {
    /// Position of the vehicle in the map frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Heading of the vehicle about the map Z axis, zero along map X.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Linear velocity of the vehicle.
    ///
    /// Units: meters/second
    pub velocity_ms: [f64; 3],

    /// Time at which the sample was taken.
    ///
    /// Units: seconds, arbitrary epoch shared by all samples of a run
    pub timestamp_s: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_sample() {
        let s: OdomSample = serde_json::from_str(
            r#"{
                "position_m": [-77.9, -17.59, 0.1],
                "yaw_rad": 1.57,
                "velocity_ms": [0.0, 2.5, 0.0],
                "timestamp_s": 12.25
            }"#,
        )
        .unwrap();

        assert_eq!(s.position_m, [-77.9, -17.59, 0.1]);
        assert_eq!(s.velocity_ms[1], 2.5);
        assert_eq!(s.timestamp_s, 12.25);
    }
}
