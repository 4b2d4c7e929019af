//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod stepper;

pub use stepper::{SharedStepper, StepOutcome, StepperDriver, StepperError};
