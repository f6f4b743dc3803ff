//! # Frame transforms
//!
//! Goals are given in the map frame but the control law works on the bearing to the goal from the
//! vehicle, so each goal is converted into the vehicle frame (X forward, Y left) before use.
//!
//! Transform sources may be briefly unavailable, for example before the first pose has been
//! broadcast. [`transform_with_retry`] retries such failures with a fixed delay until the
//! transform succeeds, a timeout elapses, or shutdown is requested.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use nalgebra::{Rotation2, Vector2};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

// Internal
use crate::vehicle::VehicleState;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Converts map frame points into the vehicle frame.
pub trait FrameTransformer {
    /// Convert `world_m` into the vehicle frame of `state`.
    ///
    /// Returns `TransformError::Unavailable` if the transform cannot be computed right now. Such
    /// failures are expected to clear on their own.
    fn to_local(
        &mut self,
        world_m: &Vector2<f64>,
        state: &VehicleState,
    ) -> Result<Vector2<f64>, TransformError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Transforms using the vehicle's own pose from odometry.
#[derive(Debug, Default, Copy, Clone)]
pub struct PoseFrameTransformer;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    #[error("Frame transform unavailable: {0}")]
    Unavailable(String),

    #[error("Frame transform still unavailable after {0:.3} s")]
    TimedOut(f64),

    #[error("Shutdown requested while waiting for the frame transform")]
    Shutdown,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FrameTransformer for PoseFrameTransformer {
    fn to_local(
        &mut self,
        world_m: &Vector2<f64>,
        state: &VehicleState,
    ) -> Result<Vector2<f64>, TransformError> {
        if !state.is_finite() {
            return Err(TransformError::Unavailable(format!(
                "vehicle pose is not finite: {:?}",
                state
            )));
        }

        let offset_m = world_m - state.position_m.xy();

        Ok(Rotation2::new(-state.yaw_rad) * offset_m)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Transform `world_m` into the vehicle frame, retrying while the transform is unavailable.
///
/// Each failed attempt waits `retry_delay` before trying again. Gives up with
/// `TransformError::TimedOut` once `timeout` has elapsed, or `TransformError::Shutdown` as soon as
/// `shutdown` is raised.
pub fn transform_with_retry<T>(
    transformer: &mut T,
    world_m: &Vector2<f64>,
    state: &VehicleState,
    retry_delay: Duration,
    timeout: Duration,
    shutdown: &AtomicBool,
) -> Result<Vector2<f64>, TransformError>
where
    T: FrameTransformer + ?Sized,
{
    let start = Instant::now();
    let mut num_attempts = 0usize;

    loop {
        num_attempts += 1;

        match transformer.to_local(world_m, state) {
            Ok(local_m) => {
                if num_attempts > 1 {
                    debug!("Frame transform available after {} attempts", num_attempts);
                }
                return Ok(local_m);
            }
            Err(TransformError::Unavailable(reason)) => {
                trace!("Frame transform attempt {} failed: {}", num_attempts, reason)
            }
            Err(e) => return Err(e),
        }

        if shutdown.load(Ordering::Relaxed) {
            return Err(TransformError::Shutdown);
        }

        let waited = start.elapsed();
        if waited >= timeout {
            return Err(TransformError::TimedOut(waited.as_secs_f64()));
        }

        thread::sleep(retry_delay);
    }
}

// ---------------------------------------------------------------------------
// TEST DOUBLES
// ---------------------------------------------------------------------------

/// Fails a set number of times before transforming with the vehicle pose.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyTransformer {
    pub failures_left: usize,
    pub num_calls: usize,
}

#[cfg(test)]
impl FrameTransformer for FlakyTransformer {
    fn to_local(
        &mut self,
        world_m: &Vector2<f64>,
        state: &VehicleState,
    ) -> Result<Vector2<f64>, TransformError> {
        self.num_calls += 1;

        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(TransformError::Unavailable("frames not yet published".into()));
        }

        PoseFrameTransformer.to_local(world_m, state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    fn state_at(x: f64, y: f64, yaw_rad: f64) -> VehicleState {
        VehicleState {
            position_m: Vector3::new(x, y, 0.0),
            yaw_rad,
            velocity_ms: Vector3::zeros(),
        }
    }

    fn approx_eq(a: &Vector2<f64>, b: &Vector2<f64>) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn test_pose_transform() {
        let mut t = PoseFrameTransformer;

        // Facing map +X, goal straight ahead
        let local = t
            .to_local(&Vector2::new(10.0, 0.0), &state_at(0.0, 0.0, 0.0))
            .unwrap();
        assert!(approx_eq(&local, &Vector2::new(10.0, 0.0)));

        // Facing map +Y, a goal along map +Y is ahead and one along map +X is to the right
        let facing_y = state_at(1.0, 1.0, FRAC_PI_2);
        let local = t.to_local(&Vector2::new(1.0, 11.0), &facing_y).unwrap();
        assert!(approx_eq(&local, &Vector2::new(10.0, 0.0)));
        let local = t.to_local(&Vector2::new(6.0, 1.0), &facing_y).unwrap();
        assert!(approx_eq(&local, &Vector2::new(0.0, -5.0)));

        let bad = state_at(std::f64::NAN, 0.0, 0.0);
        assert!(t.to_local(&Vector2::zeros(), &bad).is_err());
    }

    #[test]
    fn test_retry_until_available() {
        let mut t = FlakyTransformer {
            failures_left: 3,
            ..Default::default()
        };
        let shutdown = AtomicBool::new(false);

        let local = transform_with_retry(
            &mut t,
            &Vector2::new(0.0, 10.0),
            &state_at(0.0, 0.0, 0.0),
            Duration::from_millis(1),
            Duration::from_secs(5),
            &shutdown,
        )
        .unwrap();

        assert_eq!(t.num_calls, 4);
        assert!(approx_eq(&local, &Vector2::new(0.0, 10.0)));
    }

    #[test]
    fn test_retry_timeout() {
        let mut t = FlakyTransformer {
            failures_left: usize::MAX,
            ..Default::default()
        };
        let shutdown = AtomicBool::new(false);

        match transform_with_retry(
            &mut t,
            &Vector2::zeros(),
            &state_at(0.0, 0.0, 0.0),
            Duration::from_millis(1),
            Duration::from_millis(20),
            &shutdown,
        ) {
            Err(TransformError::TimedOut(s)) => assert!(s >= 0.02),
            r => panic!("Expected timeout, got {:?}", r),
        }
    }

    #[test]
    fn test_retry_shutdown() {
        let mut t = FlakyTransformer {
            failures_left: usize::MAX,
            ..Default::default()
        };
        let shutdown = AtomicBool::new(true);

        let r = transform_with_retry(
            &mut t,
            &Vector2::zeros(),
            &state_at(0.0, 0.0, 0.0),
            Duration::from_millis(1),
            Duration::from_secs(60),
            &shutdown,
        );

        assert_eq!(r, Err(TransformError::Shutdown));
        assert_eq!(t.num_calls, 1);
    }
}
