//! Motor parameter record

/// Microstepping mode
///
/// Wire values: 0 = full, 1 = half, 2 = quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StepMode {
    #[default]
    Full = 0,
    Half = 1,
    Quarter = 2,
}

impl StepMode {
    /// Decode a wire value, rejecting anything outside {0, 1, 2}
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Full),
            1 => Some(Self::Half),
            2 => Some(Self::Quarter),
            _ => None,
        }
    }

    /// Wire value of this mode
    pub const fn as_wire(self) -> u8 {
        self as u8
    }
}

/// One complete motion configuration
///
/// Copied whole on every handoff: a command on the motor queue is always a
/// full record, never a delta.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorParameters {
    /// Maximum speed (steps/s), never negative
    pub rotational_speed: f32,
    /// Acceleration (steps/s²), never negative
    pub rotational_accel: f32,
    /// Deceleration (steps/s²), never negative
    pub rotational_decel: f32,
    /// Position the driver is told it is at before the move
    pub current_position: i32,
    /// Absolute move target
    pub final_position: u32,
    /// Microstepping mode
    pub step_mode: StepMode,
    /// Hold time after the move (ms)
    pub dwell_time_ms: u32,
}

impl MotorParameters {
    /// All-zero record used at boot
    pub const fn new() -> Self {
        Self {
            rotational_speed: 0.0,
            rotational_accel: 0.0,
            rotational_decel: 0.0,
            current_position: 0,
            final_position: 0,
            step_mode: StepMode::Full,
            dwell_time_ms: 0,
        }
    }

    /// Move target as a signed driver position
    ///
    /// Targets beyond `i32::MAX` saturate.
    pub fn target_position(&self) -> i32 {
        i32::try_from(self.final_position).unwrap_or(i32::MAX)
    }
}

impl Default for MotorParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest driver feedback, written by the motion task after every step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverFeedback {
    /// Position in steps
    pub position: i32,
    /// Signed speed in steps/s
    pub speed: f32,
}

impl DriverFeedback {
    /// Direction flag reported by the status endpoint (1 = forward)
    pub fn direction(&self) -> u8 {
        if self.speed >= 0.0 {
            1
        } else {
            0
        }
    }
}
