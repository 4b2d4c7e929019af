//! Status indicators
//!
//! - [`LedBank`]: green status LEDs, written as a bit pattern
//! - [`StopLamp`]: red emergency lamp

pub mod lamp;
pub mod leds;

pub use lamp::StopLamp;
pub use leds::LedBank;
