//! Board-agnostic core logic for the stepper motion controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper driver)
//! - Motor parameter store and query-string merging
//! - Mailboxes connecting the control tasks
//! - Emergency-stop precedence protocol
//! - Motion runner (configure, move, dwell)
//! - HTTP endpoint routing and JSON responses
//! - Pushbutton dispatch and LED rendering
//! - Configuration type definitions and parsing

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod buttons;
pub mod config;
pub mod emergency;
pub mod http;
pub mod led;
pub mod mailbox;
pub mod motion;
pub mod params;
pub mod traits;
