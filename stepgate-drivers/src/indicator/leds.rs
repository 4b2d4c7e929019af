//! Green status LED bank

use embedded_hal::digital::OutputPin;

/// A row of LEDs driven from a bit pattern (bit n = LED n)
pub struct LedBank<P, const N: usize> {
    pins: [P; N],
    pattern: u8,
}

impl<P: OutputPin, const N: usize> LedBank<P, N> {
    const FITS_PATTERN: () = assert!(N <= 8, "LedBank holds at most 8 LEDs");

    /// Create the bank with every LED off
    pub fn new(pins: [P; N]) -> Result<Self, P::Error> {
        let () = Self::FITS_PATTERN;
        let mut bank = Self { pins, pattern: 0 };
        bank.write(0)?;
        Ok(bank)
    }

    /// Show a pattern; bits beyond the bank size are ignored
    pub fn write(&mut self, pattern: u8) -> Result<(), P::Error> {
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if pattern & (1 << i) != 0 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        self.pattern = pattern;
        Ok(())
    }

    /// Last pattern written
    pub fn pattern(&self) -> u8 {
        self.pattern
    }
}
