//! Pushbutton bank
//!
//! Buttons are wired to ground with the internal pull-ups enabled, so a
//! pressed button reads low. No debouncing is done here.

use embedded_hal::digital::InputPin;

/// A set of buttons sampled together
///
/// The pattern is a `u8`, so a bank holds at most 8 buttons; a larger `N`
/// fails to compile.
pub struct ButtonBank<P, const N: usize> {
    pins: [P; N],
}

impl<P: InputPin, const N: usize> ButtonBank<P, N> {
    const FITS_PATTERN: () = assert!(N <= 8, "ButtonBank holds at most 8 buttons");

    pub fn new(pins: [P; N]) -> Self {
        let () = Self::FITS_PATTERN;
        Self { pins }
    }

    /// Read all buttons (bit n set = button n pressed)
    pub fn sample(&mut self) -> Result<u8, P::Error> {
        let mut pattern = 0;
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if pin.is_low()? {
                pattern |= 1 << i;
            }
        }
        Ok(pattern)
    }
}
