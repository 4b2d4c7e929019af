//! GPIO step/direction stepper driver
//!
//! Drives a STEP/DIR/EN driver chip (A4988/DRV8825 style) with two
//! microstep select lines. The ramp is computed one step at a time:
//!
//! - accelerating: v' = sqrt(v² + 2a), capped at the maximum speed
//! - decelerating once the remaining distance is within the stopping
//!   distance v² / 2d: v' = sqrt(v² - 2d)
//!
//! An acceleration or deceleration of 0 means an instant speed change.

use embedded_hal::digital::OutputPin;
use libm::sqrtf;

use stepgate_core::params::StepMode;
use stepgate_core::traits::{StepOutcome, StepperDriver, StepperError};

/// Pin polarity options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioStepperConfig {
    /// Swap the meaning of the DIR level
    pub invert_direction: bool,
    /// EN pin enables the driver when low
    pub enable_active_low: bool,
}

impl Default for GpioStepperConfig {
    fn default() -> Self {
        Self {
            invert_direction: false,
            enable_active_low: true,
        }
    }
}

/// Microstep select levels (MS1, MS2) for a step mode
pub fn microstep_levels(mode: StepMode) -> (bool, bool) {
    match mode {
        StepMode::Full => (false, false),
        StepMode::Half => (true, false),
        StepMode::Quarter => (false, true),
    }
}

/// Stepper driven through plain GPIO pins
pub struct GpioStepper<STEP, DIR, EN, MS1, MS2> {
    step: STEP,
    dir: DIR,
    enable: EN,
    ms1: MS1,
    ms2: MS2,
    config: GpioStepperConfig,
    position: i32,
    target: i32,
    /// Speed magnitude of the last step (steps/s)
    speed: f32,
    /// +1 or -1
    direction: i8,
    max_speed: f32,
    accel: f32,
    decel: f32,
    step_mode: StepMode,
    enabled: bool,
}

impl<STEP, DIR, EN, MS1, MS2> GpioStepper<STEP, DIR, EN, MS1, MS2>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    MS1: OutputPin,
    MS2: OutputPin,
{
    /// Create a driver with the windings off
    pub fn new(
        step: STEP,
        dir: DIR,
        enable: EN,
        ms1: MS1,
        ms2: MS2,
        config: GpioStepperConfig,
    ) -> Result<Self, StepperError> {
        let mut stepper = Self {
            step,
            dir,
            enable,
            ms1,
            ms2,
            config,
            position: 0,
            target: 0,
            speed: 0.0,
            direction: 1,
            max_speed: 0.0,
            accel: 0.0,
            decel: 0.0,
            step_mode: StepMode::Full,
            enabled: false,
        };
        stepper.initialize()?;
        stepper.disable_motor()?;
        Ok(stepper)
    }

    /// Target of the armed move
    pub fn target(&self) -> i32 {
        self.target
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    fn write_enable(&mut self, enabled: bool) -> Result<(), StepperError> {
        let level = enabled != self.config.enable_active_low;
        set_level(&mut self.enable, level)?;
        self.enabled = enabled;
        Ok(())
    }

    fn write_direction(&mut self, direction: i8) -> Result<(), StepperError> {
        let level = (direction > 0) != self.config.invert_direction;
        set_level(&mut self.dir, level)?;
        self.direction = direction;
        Ok(())
    }

    fn write_step_mode(&mut self, mode: StepMode) -> Result<(), StepperError> {
        let (ms1, ms2) = microstep_levels(mode);
        set_level(&mut self.ms1, ms1)?;
        set_level(&mut self.ms2, ms2)?;
        self.step_mode = mode;
        Ok(())
    }

    fn pulse(&mut self) -> Result<(), StepperError> {
        self.step.set_high().map_err(|_| StepperError::Gpio)?;
        self.step.set_low().map_err(|_| StepperError::Gpio)
    }

    /// Steps needed to stop from the current speed
    fn stopping_distance(&self) -> f32 {
        if self.decel <= 0.0 {
            0.0
        } else {
            self.speed * self.speed / (2.0 * self.decel)
        }
    }

    /// Speed for the next step given the remaining distance
    fn next_speed(&self, remaining: u32) -> f32 {
        let v = self.speed;
        let next = if self.decel > 0.0 && v > 0.0 && remaining as f32 <= self.stopping_distance() {
            let slowed = v * v - 2.0 * self.decel;
            if slowed > 0.0 {
                sqrtf(slowed)
            } else {
                sqrtf(2.0 * self.decel).min(v)
            }
        } else if v < self.max_speed {
            if self.accel <= 0.0 {
                self.max_speed
            } else {
                sqrtf(v * v + 2.0 * self.accel)
            }
        } else {
            self.max_speed
        };
        next.min(self.max_speed)
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), StepperError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| StepperError::Gpio)
}

impl<STEP, DIR, EN, MS1, MS2> StepperDriver for GpioStepper<STEP, DIR, EN, MS1, MS2>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    MS1: OutputPin,
    MS2: OutputPin,
{
    fn set_speed(&mut self, steps_per_s: f32) {
        self.max_speed = steps_per_s.max(0.0);
    }

    fn set_accel(&mut self, steps_per_s2: f32) {
        self.accel = steps_per_s2.max(0.0);
    }

    fn set_decel(&mut self, steps_per_s2: f32) {
        self.decel = steps_per_s2.max(0.0);
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
        self.speed = 0.0;
    }

    fn set_step_mode(&mut self, mode: StepMode) -> Result<(), StepperError> {
        self.write_step_mode(mode)
    }

    fn move_absolute(&mut self, target: i32) -> Result<(), StepperError> {
        if target != self.position && self.max_speed <= 0.0 {
            return Err(StepperError::ZeroSpeed);
        }
        self.target = target;
        self.write_enable(true)
    }

    fn run(&mut self) -> Result<StepOutcome, StepperError> {
        let distance = i64::from(self.target) - i64::from(self.position);
        if distance == 0 {
            self.speed = 0.0;
            return Ok(StepOutcome::Idle);
        }

        let direction: i8 = if distance > 0 { 1 } else { -1 };
        if direction != self.direction {
            self.speed = 0.0;
            self.write_direction(direction)?;
        }

        let remaining = u32::try_from(distance.unsigned_abs()).unwrap_or(u32::MAX);
        let speed = self.next_speed(remaining);
        if speed <= 0.0 {
            self.speed = 0.0;
            return Err(StepperError::ZeroSpeed);
        }

        self.pulse()?;
        self.position += i32::from(direction);
        self.speed = speed;

        let next_step_in_us = (1_000_000.0 / speed) as u32;
        Ok(StepOutcome::Stepped {
            next_step_in_us: next_step_in_us.max(1),
        })
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn speed(&self) -> f32 {
        self.speed * f32::from(self.direction)
    }

    fn initialize(&mut self) -> Result<(), StepperError> {
        self.speed = 0.0;
        self.target = self.position;
        self.step.set_low().map_err(|_| StepperError::Gpio)?;
        self.write_direction(1)?;
        self.write_step_mode(StepMode::Full)
    }

    fn disable_motor(&mut self) -> Result<(), StepperError> {
        self.write_enable(false)
    }

    fn setup_controlled_stop(&mut self) {
        if self.speed <= 0.0 {
            self.target = self.position;
            return;
        }
        let steps = libm::ceilf(self.stopping_distance()) as i32;
        self.target = self
            .position
            .saturating_add(steps * i32::from(self.direction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{BrokenPin, MockPin};

    type TestStepper = GpioStepper<MockPin, MockPin, MockPin, MockPin, MockPin>;

    fn stepper() -> TestStepper {
        GpioStepper::new(
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            GpioStepperConfig::default(),
        )
        .unwrap()
    }

    fn run_to_idle(s: &mut TestStepper) -> u32 {
        let mut steps = 0;
        while let StepOutcome::Stepped { .. } = s.run().unwrap() {
            steps += 1;
            assert!(steps < 100_000, "runaway move");
        }
        steps
    }

    #[test]
    fn test_starts_disabled() {
        let s = stepper();
        assert!(!s.is_enabled());
        // Active-low enable: high = off
        assert!(s.enable.high);
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn test_move_emits_one_pulse_per_step() {
        let mut s = stepper();
        s.set_speed(1000.0);
        s.move_absolute(50).unwrap();
        assert!(s.is_enabled());
        assert!(!s.enable.high);

        assert_eq!(run_to_idle(&mut s), 50);
        assert_eq!(s.position(), 50);
        assert_eq!(s.step.rising_edges, 50);
        assert!(s.is_stopped());
    }

    #[test]
    fn test_reverse_move_sets_direction() {
        let mut s = stepper();
        s.set_speed(500.0);
        s.set_position(10);
        s.move_absolute(-5).unwrap();

        s.run().unwrap();
        assert!(!s.dir.high);
        assert!(s.speed() < 0.0);
        run_to_idle(&mut s);
        assert_eq!(s.position(), -5);
    }

    #[test]
    fn test_zero_speed_rejected() {
        let mut s = stepper();
        assert_eq!(s.move_absolute(10), Err(StepperError::ZeroSpeed));
        // Moving to where we already are is fine
        assert_eq!(s.move_absolute(0), Ok(()));
    }

    #[test]
    fn test_acceleration_ramp() {
        let mut s = stepper();
        s.set_speed(100.0);
        s.set_accel(200.0);
        s.move_absolute(1000).unwrap();

        let mut intervals = [0u32; 3];
        for interval in intervals.iter_mut() {
            match s.run().unwrap() {
                StepOutcome::Stepped { next_step_in_us } => *interval = next_step_in_us,
                StepOutcome::Idle => panic!("stopped early"),
            }
        }
        // sqrt(400) = 20 steps/s, then sqrt(800), sqrt(1200)
        assert_eq!(intervals[0], 50_000);
        assert!(intervals[1] < intervals[0]);
        assert!(intervals[2] < intervals[1]);

        for _ in 0..100 {
            s.run().unwrap();
        }
        assert_eq!(s.speed(), 100.0);
    }

    #[test]
    fn test_deceleration_reaches_target() {
        let mut s = stepper();
        s.set_speed(200.0);
        s.set_accel(400.0);
        s.set_decel(400.0);
        s.move_absolute(300).unwrap();

        let mut max_seen = 0.0f32;
        let mut last_speed = 0.0f32;
        while let StepOutcome::Stepped { .. } = s.run().unwrap() {
            max_seen = max_seen.max(s.speed());
            last_speed = s.speed();
        }
        assert_eq!(s.position(), 300);
        assert_eq!(max_seen, 200.0);
        assert!(last_speed < 50.0);
    }

    #[test]
    fn test_controlled_stop_shortens_move() {
        let mut s = stepper();
        s.set_speed(200.0);
        s.set_decel(400.0);
        s.move_absolute(10_000).unwrap();
        for _ in 0..20 {
            s.run().unwrap();
        }
        assert_eq!(s.speed(), 200.0);

        s.setup_controlled_stop();
        // 200² / (2 · 400) = 50 steps
        assert_eq!(s.target(), 20 + 50);

        run_to_idle(&mut s);
        assert_eq!(s.position(), 70);
        assert!(s.is_stopped());
    }

    #[test]
    fn test_controlled_stop_when_idle() {
        let mut s = stepper();
        s.set_position(42);
        s.setup_controlled_stop();
        assert_eq!(s.target(), 42);
        assert_eq!(s.run(), Ok(StepOutcome::Idle));
    }

    #[test]
    fn test_initialize_and_disable_mid_move() {
        let mut s = stepper();
        s.set_speed(100.0);
        s.set_step_mode(StepMode::Quarter).unwrap();
        s.move_absolute(100).unwrap();
        s.run().unwrap();
        s.run().unwrap();

        s.initialize().unwrap();
        s.disable_motor().unwrap();

        assert_eq!(s.position(), 2);
        assert_eq!(s.target(), 2);
        assert_eq!(s.speed(), 0.0);
        assert_eq!(s.step_mode(), StepMode::Full);
        assert!(!s.is_enabled());
        assert_eq!(s.run(), Ok(StepOutcome::Idle));
    }

    #[test]
    fn test_microstep_pins() {
        let mut s = stepper();
        s.set_step_mode(StepMode::Half).unwrap();
        assert!(s.ms1.high && !s.ms2.high);
        s.set_step_mode(StepMode::Quarter).unwrap();
        assert!(!s.ms1.high && s.ms2.high);
        s.set_step_mode(StepMode::Full).unwrap();
        assert!(!s.ms1.high && !s.ms2.high);
    }

    #[test]
    fn test_gpio_failure_is_reported() {
        let result = GpioStepper::new(
            BrokenPin,
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            GpioStepperConfig::default(),
        );
        assert!(matches!(result, Err(StepperError::Gpio)));
    }
}
