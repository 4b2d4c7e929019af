//! Emergency stop handling
//!
//! The emergency task is the only place allowed to override motion: it owns
//! the stop lamp, can suspend and resume the motion task, and can halt the
//! driver at any time.

pub mod protocol;
pub mod signal;

pub use protocol::{CycleReport, EmergencyEffects, EmergencyProtocol, DEFAULT_SOFT_STOP_THRESHOLD};
pub use signal::EmergencySignal;
