//! # Communications interface crate.
//!
//! Provides the messages exchanged between the controller and the vehicle interface, and the
//! networking helpers used to move them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Vehicle command messages (gear, throttle, steering)
pub mod cmd;

/// Network module
pub mod net;

/// Odometry sample messages
pub mod odom;
