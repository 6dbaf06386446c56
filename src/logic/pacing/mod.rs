//! Pacing Module
//!
//! Adaptive per-session delays driven by success and failure streaks.

pub mod delay;
pub mod table;

pub use delay::{DelayController, DelayState, MAX_MULTIPLIER, MIN_MULTIPLIER};
pub use table::{PacingTable, SharedDelay};
