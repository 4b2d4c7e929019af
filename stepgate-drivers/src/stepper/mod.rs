//! Stepper driver implementations

pub mod gpio;

pub use gpio::{GpioStepper, GpioStepperConfig};
