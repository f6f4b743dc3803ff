//! # Trajectory control library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the control executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command publisher - sends gear, throttle and steering demands to the vehicle
pub mod cmd_publisher;

/// Controller - owns the mission state and runs the loop for each odometry sample
pub mod controller;

/// Control law - computes the vehicle demands each tick
pub mod ctrl_law;

/// Frame transforms - converts map frame goals into the vehicle frame
pub mod frame;

/// Missions - waypoint tables and goal types
pub mod mission;

/// Odometry client - receives odometry samples from the vehicle interface
pub mod odom_client;

/// Odometry ingest - sample timing and control tick scheduling
pub mod odom_ingest;

/// Vehicle state - latest pose and velocity
pub mod vehicle;

/// Waypoint sequencer - tracks the active goal as waypoints are reached
pub mod waypoint_seq;
