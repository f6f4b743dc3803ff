//! # Waypoint sequencer
//!
//! Owns the queue of remaining mission waypoints. The front of the queue is the active goal. The
//! queue only ever shrinks: the front is popped when the vehicle enters its arrival radius.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use nalgebra::Vector3;
use std::collections::VecDeque;

// Internal
use crate::mission::{Mission, Waypoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sequences the mission waypoints as the vehicle reaches them.
#[derive(Debug, Clone)]
pub struct WaypointSequencer {
    /// Waypoints not yet reached, front is active.
    queue: VecDeque<Waypoint>,

    /// The goal the controller is steering towards.
    ///
    /// Once the queue is exhausted this keeps the last goal that was active.
    active: Option<Waypoint>,

    num_passed: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointSequencer {
    pub fn new(mission: &Mission) -> Self {
        let queue: VecDeque<Waypoint> = mission.waypoints.iter().copied().collect();
        let active = queue.front().copied();

        Self {
            queue,
            active,
            num_passed: 0,
        }
    }

    /// Check whether the vehicle has arrived at the active goal.
    ///
    /// The distance is measured in 3D with the waypoint on the ground plane (z = 0). If the vehicle
    /// is inside the goal's arrival radius the goal is removed from the queue, the next one becomes
    /// active, and the passed waypoint is returned.
    pub fn check_arrival(&mut self, position_m: &Vector3<f64>) -> Option<Waypoint> {
        let goal = *self.queue.front()?;

        let goal_m = Vector3::new(goal.position_m[0], goal.position_m[1], 0.0);
        let dist_m = (position_m - goal_m).norm();

        if dist_m >= goal.goal_type.arrival_radius_m() {
            return None;
        }

        info!(
            "Passed point: [{:.2}, {:.2}]",
            goal.position_m[0], goal.position_m[1]
        );

        self.queue.pop_front();
        self.num_passed += 1;

        match self.queue.front() {
            Some(next) => self.active = Some(*next),
            None => warn!(
                "Waypoint queue exhausted at a {} goal, holding the last goal",
                goal.goal_type
            ),
        }

        Some(goal)
    }

    /// The active goal, or `None` if the mission had no waypoints.
    pub fn current_goal(&self) -> Option<Waypoint> {
        self.active
    }

    /// Number of waypoints still to be reached.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn num_passed(&self) -> usize {
        self.num_passed
    }

    /// True once every waypoint has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mission::GoalType;

    fn mission(waypoints: Vec<Waypoint>) -> Mission {
        Mission {
            index: 0,
            name: "test".into(),
            waypoints,
        }
    }

    #[test]
    fn test_arrival_radius() {
        let mut seq = WaypointSequencer::new(&mission(vec![
            Waypoint::new(0.0, 10.0, GoalType::Straight),
            Waypoint::new(0.0, 30.0, GoalType::Corner),
            Waypoint::new(0.0, 50.0, GoalType::FinalStop),
        ]));

        assert_eq!(seq.remaining(), 3);
        assert_eq!(seq.current_goal().unwrap().goal_type, GoalType::Straight);

        // Straight goals need the vehicle within 3 m
        assert_eq!(seq.check_arrival(&Vector3::new(0.0, 6.5, 0.0)), None);
        let passed = seq.check_arrival(&Vector3::new(0.0, 7.5, 0.0)).unwrap();
        assert_eq!(passed.goal_type, GoalType::Straight);
        assert_eq!(seq.current_goal().unwrap().goal_type, GoalType::Corner);

        // Corner goals within 5 m
        let passed = seq.check_arrival(&Vector3::new(0.0, 25.5, 0.0)).unwrap();
        assert_eq!(passed.goal_type, GoalType::Corner);
        assert_eq!(seq.remaining(), 1);
        assert_eq!(seq.num_passed(), 2);
    }

    #[test]
    fn test_arrival_uses_height() {
        let mut seq =
            WaypointSequencer::new(&mission(vec![Waypoint::new(0.0, 0.0, GoalType::Straight)]));

        // 2 m in plane but 4 m up puts the vehicle outside the 3 m radius
        assert_eq!(seq.check_arrival(&Vector3::new(2.0, 0.0, 4.0)), None);
        assert!(seq.check_arrival(&Vector3::new(2.0, 0.0, 0.0)).is_some());
    }

    #[test]
    fn test_exhausted_queue_holds_last_goal() {
        let last = Waypoint::new(10.0, 0.0, GoalType::PostCorner);
        let mut seq = WaypointSequencer::new(&mission(vec![
            Waypoint::new(0.0, 0.0, GoalType::Straight),
            last,
        ]));

        let mut prev_len = seq.remaining();
        for p in &[
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
        ] {
            seq.check_arrival(p);
            assert!(seq.remaining() <= prev_len);
            prev_len = seq.remaining();
        }

        assert!(seq.is_exhausted());
        assert_eq!(seq.current_goal(), Some(last));
        assert_eq!(seq.num_passed(), 2);
    }

    #[test]
    fn test_empty_mission() {
        let mut seq = WaypointSequencer::new(&mission(vec![]));

        assert_eq!(seq.current_goal(), None);
        assert_eq!(seq.check_arrival(&Vector3::zeros()), None);
        assert!(seq.is_exhausted());
    }
}
