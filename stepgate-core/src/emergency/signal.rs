//! Emergency request flags

/// Hard stop request bit
pub const STOP_BIT: u8 = 0x01;
/// Resume request bit
pub const RESUME_BIT: u8 = 0x02;
/// Soft stop (once under the speed threshold) bit
pub const SOFT_STOP_BIT: u8 = 0x10;
/// Stop lamp blink bit
pub const BLINK_BIT: u8 = 0x20;

/// Set of pending emergency conditions
///
/// Each condition is independent; the protocol evaluates the whole set every
/// cycle in a fixed order. The bit encoding is only used at the edges
/// (buttons, logging, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EmergencySignal {
    pub stop: bool,
    pub resume: bool,
    pub soft_stop: bool,
    pub blink: bool,
}

impl EmergencySignal {
    pub const NONE: Self = Self {
        stop: false,
        resume: false,
        soft_stop: false,
        blink: false,
    };

    pub const STOP: Self = Self {
        stop: true,
        ..Self::NONE
    };

    pub const RESUME: Self = Self {
        resume: true,
        ..Self::NONE
    };

    pub const SOFT_STOP: Self = Self {
        soft_stop: true,
        ..Self::NONE
    };

    pub const BLINK: Self = Self {
        blink: true,
        ..Self::NONE
    };

    /// Signal held after a hard stop: blink and suspend once slow enough
    pub const REARMED: Self = Self {
        soft_stop: true,
        blink: true,
        ..Self::NONE
    };

    /// Decode wire bits; reserved bits are ignored
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            stop: bits & STOP_BIT != 0,
            resume: bits & RESUME_BIT != 0,
            soft_stop: bits & SOFT_STOP_BIT != 0,
            blink: bits & BLINK_BIT != 0,
        }
    }

    /// Encode as wire bits
    pub const fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.stop {
            bits |= STOP_BIT;
        }
        if self.resume {
            bits |= RESUME_BIT;
        }
        if self.soft_stop {
            bits |= SOFT_STOP_BIT;
        }
        if self.blink {
            bits |= BLINK_BIT;
        }
        bits
    }

    /// Conditions set in either signal
    pub const fn union(self, other: Self) -> Self {
        Self {
            stop: self.stop || other.stop,
            resume: self.resume || other.resume,
            soft_stop: self.soft_stop || other.soft_stop,
            blink: self.blink || other.blink,
        }
    }

    pub const fn is_empty(self) -> bool {
        !(self.stop || self.resume || self.soft_stop || self.blink)
    }
}
