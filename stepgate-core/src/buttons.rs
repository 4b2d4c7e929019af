//! Pushbutton dispatch
//!
//! The pushbutton task posts raw button patterns (bit n = button n pressed).
//! The dispatcher turns rising edges into actions:
//!
//! | Button | Action |
//! |---|---|
//! | 0 | Emergency stop |
//! | 1 | Resume |
//! | 2 | Soft stop with blinking lamp |
//! | 3 | Replay the stored parameters as a new motor command |

use crate::emergency::EmergencySignal;

/// Number of buttons handled
pub const BUTTON_COUNT: u8 = 4;

const STOP: u8 = 1 << 0;
const RESUME: u8 = 1 << 1;
const SOFT_STOP: u8 = 1 << 2;
const REPLAY: u8 = 1 << 3;

/// Actions triggered by one button sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonActions {
    /// Signal for the emergency mailbox (buttons pressed together are merged)
    pub emergency: Option<EmergencySignal>,
    /// Queue the current parameter snapshot
    pub replay: bool,
}

impl ButtonActions {
    pub fn is_empty(&self) -> bool {
        self.emergency.is_none() && !self.replay
    }
}

/// Rising-edge detector for the button bank
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonDispatcher {
    last: u8,
}

impl ButtonDispatcher {
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Process a new sample
    ///
    /// Holding a button does nothing after the first sample; it has to be
    /// released and pressed again.
    pub fn dispatch(&mut self, pattern: u8) -> ButtonActions {
        let pressed = pattern & !self.last;
        self.last = pattern;

        let mut signal = EmergencySignal::NONE;
        if pressed & STOP != 0 {
            signal = signal.union(EmergencySignal::STOP);
        }
        if pressed & RESUME != 0 {
            signal = signal.union(EmergencySignal::RESUME);
        }
        if pressed & SOFT_STOP != 0 {
            signal = signal.union(EmergencySignal::REARMED);
        }

        ButtonActions {
            emergency: (!signal.is_empty()).then_some(signal),
            replay: pressed & REPLAY != 0,
        }
    }
}
