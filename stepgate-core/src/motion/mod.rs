//! Motion task logic
//!
//! - [`MotionRunner`]: configure, move and dwell for one command
//! - [`MotionGate`]: suspension flag the emergency task controls

pub mod gate;
pub mod runner;

pub use gate::MotionGate;
pub use runner::{CycleOutcome, MotionPhase, MotionRunner, MoveSummary};
