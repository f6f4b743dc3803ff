//! Utility library for the trajectory control software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;
