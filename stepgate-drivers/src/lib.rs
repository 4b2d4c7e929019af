//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in stepgate-core on top of `embedded-hal` pins:
//!
//! - Stepper driver (STEP/DIR/EN with microstep select, trapezoidal ramp)
//! - Status indicators (green LED bank, stop lamp)
//! - Pushbutton bank

#![no_std]
#![deny(unsafe_code)]

pub mod buttons;
pub mod indicator;
pub mod stepper;

#[cfg(test)]
pub(crate) mod mock;
