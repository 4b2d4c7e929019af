//! Pin doubles shared by the driver tests

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Output pin that records its level and rising edges
#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    pub rising_edges: u32,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.rising_edges += 1;
        }
        self.high = true;
        Ok(())
    }
}

/// Output pin whose writes always fail
#[derive(Debug, Default)]
pub struct BrokenPin;

#[derive(Debug)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl ErrorType for BrokenPin {
    type Error = PinFault;
}

impl OutputPin for BrokenPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }
}

/// Input pin driven from the test through a shared cell
#[derive(Debug, Clone, Copy)]
pub struct MockInput<'a> {
    pub level: &'a Cell<bool>,
}

impl ErrorType for MockInput<'_> {
    type Error = Infallible;
}

impl InputPin for MockInput<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}
