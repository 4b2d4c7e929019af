//! Status LED signalling
//!
//! The motion and emergency tasks post an [`LedSignal`]; the LED task keeps
//! an [`LedRenderer`] and writes its pattern to the four green LEDs every
//! frame.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::params::StepMode;

/// Number of green status LEDs
pub const LED_COUNT: u8 = 4;

const ALL_ON: u8 = (1 << LED_COUNT) - 1;

/// Status update for the LED task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedSignal {
    /// A move is starting in this step mode
    StepMode(StepMode),
    /// The move finished
    StopAnimation,
    /// Hard stop requested
    EmergencyStop,
}

impl LedSignal {
    /// Wire value (step mode 0..=2, stop animation 0, emergency 3)
    pub fn to_wire(self) -> u8 {
        match self {
            LedSignal::StepMode(mode) => mode.as_wire(),
            LedSignal::StopAnimation => 0,
            LedSignal::EmergencyStop => 3,
        }
    }
}

/// Destination for LED signals
pub trait LedSink {
    /// Post a signal, replacing any unread one
    fn post(&self, signal: LedSignal);
}

impl<M: RawMutex> LedSink for Signal<M, LedSignal> {
    fn post(&self, signal: LedSignal) {
        self.signal(signal);
    }
}

/// What the LEDs are currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Display {
    Off,
    Chase { lit: u8 },
    AllOn,
}

/// LED animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRenderer {
    display: Display,
    frame: u8,
}

impl LedRenderer {
    pub const fn new() -> Self {
        Self {
            display: Display::Off,
            frame: 0,
        }
    }

    /// Switch to the animation for `signal`, restarting at frame 0
    pub fn apply(&mut self, signal: LedSignal) {
        self.display = match signal {
            LedSignal::StepMode(mode) => Display::Chase {
                lit: mode.as_wire() + 1,
            },
            LedSignal::StopAnimation => Display::Off,
            LedSignal::EmergencyStop => Display::AllOn,
        };
        self.frame = 0;
    }

    /// LED bit pattern for the current frame (bit n = LED n)
    pub fn pattern(&self) -> u8 {
        match self.display {
            Display::Off => 0,
            Display::AllOn => ALL_ON,
            Display::Chase { lit } => {
                let block = (1u8 << lit) - 1;
                let shift = self.frame % LED_COUNT;
                ((block << shift) | (block >> (LED_COUNT - shift))) & ALL_ON
            }
        }
    }

    /// Return the current pattern and advance the animation
    pub fn tick(&mut self) -> u8 {
        let pattern = self.pattern();
        if self.is_animating() {
            self.frame = (self.frame + 1) % LED_COUNT;
        }
        pattern
    }

    /// Check if an animation is running
    pub fn is_animating(&self) -> bool {
        matches!(self.display, Display::Chase { .. })
    }
}

impl Default for LedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_step_chases_single_led() {
        let mut leds = LedRenderer::new();
        leds.apply(LedSignal::StepMode(StepMode::Full));

        let frames: [u8; 5] = core::array::from_fn(|_| leds.tick());
        assert_eq!(frames, [0b0001, 0b0010, 0b0100, 0b1000, 0b0001]);
    }

    #[test]
    fn test_quarter_step_chases_three_leds() {
        let mut leds = LedRenderer::new();
        leds.apply(LedSignal::StepMode(StepMode::Quarter));

        let frames: [u8; 4] = core::array::from_fn(|_| leds.tick());
        assert_eq!(frames, [0b0111, 0b1110, 0b1101, 0b1011]);
    }

    #[test]
    fn test_stop_and_emergency_patterns() {
        let mut leds = LedRenderer::new();
        assert_eq!(leds.tick(), 0);

        leds.apply(LedSignal::EmergencyStop);
        assert_eq!(leds.tick(), 0b1111);
        assert_eq!(leds.tick(), 0b1111);
        assert!(!leds.is_animating());

        leds.apply(LedSignal::StopAnimation);
        assert_eq!(leds.tick(), 0);
    }

    #[test]
    fn test_new_signal_restarts_animation() {
        let mut leds = LedRenderer::new();
        leds.apply(LedSignal::StepMode(StepMode::Half));
        leds.tick();
        leds.tick();
        leds.apply(LedSignal::StepMode(StepMode::Half));
        assert_eq!(leds.pattern(), 0b0011);
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(LedSignal::StepMode(StepMode::Half).to_wire(), 1);
        assert_eq!(LedSignal::StopAnimation.to_wire(), 0);
        assert_eq!(LedSignal::EmergencyStop.to_wire(), 3);
    }
}
