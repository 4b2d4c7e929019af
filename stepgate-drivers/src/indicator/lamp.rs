//! Emergency stop lamp

use embedded_hal::digital::OutputPin;

/// Single lamp output, active high
pub struct StopLamp<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StopLamp<P> {
    /// Create the lamp switched off
    pub fn new(pin: P) -> Result<Self, P::Error> {
        let mut lamp = Self { pin, on: false };
        lamp.set(false)?;
        Ok(lamp)
    }

    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
