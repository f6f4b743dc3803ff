//! # Vehicle state
//!
//! The latest known pose and velocity of the vehicle. The state is replaced wholesale by each
//! odometry sample, no history is kept.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

use comms_if::odom::OdomSample;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose and velocity of the vehicle in the map frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Default)]
pub struct VehicleState {
    /// Units: meters
    pub position_m: Vector3<f64>,

    /// Heading about the map Z axis, zero along map X.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Units: meters/second
    pub velocity_ms: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleState {
    /// Magnitude of the velocity vector.
    pub fn speed_ms(&self) -> f64 {
        self.velocity_ms.norm()
    }

    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.position_m.iter().all(|v| v.is_finite())
            && self.velocity_ms.iter().all(|v| v.is_finite())
            && self.yaw_rad.is_finite()
    }
}

impl From<&OdomSample> for VehicleState {
    fn from(sample: &OdomSample) -> Self {
        Self {
            position_m: Vector3::from(sample.position_m),
            yaw_rad: sample.yaw_rad,
            velocity_ms: Vector3::from(sample.velocity_ms),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_sample() {
        let state = VehicleState::from(&OdomSample {
            position_m: [1.0, 2.0, 3.0],
            yaw_rad: 0.5,
            velocity_ms: [3.0, 0.0, 4.0],
            timestamp_s: 0.0,
        });

        assert_eq!(state.position_m, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(state.speed_ms(), 5.0);
        assert!(state.is_finite());

        let bad = VehicleState {
            yaw_rad: std::f64::NAN,
            ..state
        };
        assert!(!bad.is_finite());
    }
}
