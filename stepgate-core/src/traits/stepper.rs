//! Stepper motor driver trait
//!
//! This trait abstracts over the stepper driver that generates the step
//! pulses and owns the speed/acceleration ramp. The application only pushes
//! a configuration, arms an absolute move and polls it to completion.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use crate::params::StepMode;

/// Errors that can occur with stepper operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperError {
    /// A GPIO write to the driver failed
    Gpio,
    /// Move requested with a zero speed limit
    ZeroSpeed,
    /// Invalid configuration
    InvalidConfig,
}

/// Result of a single [`StepperDriver::run`] poll
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// A step was emitted; call `run` again after this many microseconds
    Stepped { next_step_in_us: u32 },
    /// The motor is at its target and stopped
    Idle,
}

/// Trait for stepper motor drivers
///
/// Configuration calls only record values; they take effect on the next
/// move. `initialize` and `disable_motor` must be safe to call at any time,
/// including in the middle of a move.
pub trait StepperDriver {
    /// Set the maximum speed in steps per second
    fn set_speed(&mut self, steps_per_s: f32);

    /// Set the acceleration in steps per second squared (0 = instant)
    fn set_accel(&mut self, steps_per_s2: f32);

    /// Set the deceleration in steps per second squared (0 = instant)
    fn set_decel(&mut self, steps_per_s2: f32);

    /// Redefine the current position without moving
    fn set_position(&mut self, position: i32);

    /// Select the microstepping mode
    fn set_step_mode(&mut self, mode: StepMode) -> Result<(), StepperError>;

    /// Arm an absolute move to `target` and energize the windings
    ///
    /// The move itself is executed by polling [`run`](Self::run).
    fn move_absolute(&mut self, target: i32) -> Result<(), StepperError>;

    /// Emit at most one step toward the armed target
    fn run(&mut self) -> Result<StepOutcome, StepperError>;

    /// Get the current position in steps
    fn position(&self) -> i32;

    /// Get the current signed speed in steps per second
    fn speed(&self) -> f32;

    /// Reset the ramp state and outputs to their power-on defaults
    fn initialize(&mut self) -> Result<(), StepperError>;

    /// De-energize the motor windings
    fn disable_motor(&mut self) -> Result<(), StepperError>;

    /// Retarget the current move so the motor ramps down at the
    /// configured deceleration and stops
    fn setup_controlled_stop(&mut self);

    /// Check if the motor is stopped at its target
    fn is_stopped(&self) -> bool {
        self.speed() == 0.0
    }
}

/// A stepper driver shared between tasks
///
/// Every access is a short critical section, so the emergency task can read
/// the speed or halt the driver between two steps of a running move.
pub struct SharedStepper<M: RawMutex, D> {
    driver: Mutex<M, RefCell<D>>,
}

impl<M: RawMutex, D: StepperDriver> SharedStepper<M, D> {
    /// Wrap a driver for shared access
    pub const fn new(driver: D) -> Self {
        Self {
            driver: Mutex::new(RefCell::new(driver)),
        }
    }

    /// Run a closure with exclusive access to the driver
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        self.driver.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Get the current position in steps
    pub fn position(&self) -> i32 {
        self.with(|d| d.position())
    }

    /// Get the current signed speed in steps per second
    pub fn speed(&self) -> f32 {
        self.with(|d| d.speed())
    }

    /// Move to an absolute position and wait until the driver is idle
    ///
    /// The lock is released between steps. `on_step` sees the position and
    /// speed after every `run`, including the final idle one. Returns the
    /// final position, which differs from `target` when a controlled stop
    /// cut the move short.
    pub async fn move_absolute<T: DelayNs>(
        &self,
        target: i32,
        delay: &mut T,
        mut on_step: impl FnMut(i32, f32),
    ) -> Result<i32, StepperError> {
        self.with(|d| d.move_absolute(target))?;

        loop {
            let (outcome, position, speed) =
                self.with(|d| d.run().map(|outcome| (outcome, d.position(), d.speed())))?;
            on_step(position, speed);
            match outcome {
                StepOutcome::Stepped { next_step_in_us } => delay.delay_us(next_step_in_us).await,
                StepOutcome::Idle => return Ok(position),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted stepper used by the core tests

    use super::*;

    /// Stepper that moves one step per `run` at a fixed speed
    #[derive(Debug, Default)]
    pub struct MockStepper {
        pub max_speed: f32,
        pub accel: f32,
        pub decel: f32,
        pub position: i32,
        pub target: i32,
        pub speed: f32,
        pub step_mode: StepMode,
        pub enabled: bool,
        pub initialized: u32,
        pub controlled_stops: u32,
        pub steps: u32,
    }

    impl StepperDriver for MockStepper {
        fn set_speed(&mut self, steps_per_s: f32) {
            self.max_speed = steps_per_s;
        }

        fn set_accel(&mut self, steps_per_s2: f32) {
            self.accel = steps_per_s2;
        }

        fn set_decel(&mut self, steps_per_s2: f32) {
            self.decel = steps_per_s2;
        }

        fn set_position(&mut self, position: i32) {
            self.position = position;
            self.target = position;
        }

        fn set_step_mode(&mut self, mode: StepMode) -> Result<(), StepperError> {
            self.step_mode = mode;
            Ok(())
        }

        fn move_absolute(&mut self, target: i32) -> Result<(), StepperError> {
            if self.max_speed <= 0.0 && target != self.position {
                return Err(StepperError::ZeroSpeed);
            }
            self.target = target;
            self.enabled = true;
            Ok(())
        }

        fn run(&mut self) -> Result<StepOutcome, StepperError> {
            if self.position == self.target {
                self.speed = 0.0;
                return Ok(StepOutcome::Idle);
            }
            let dir = if self.target > self.position { 1 } else { -1 };
            self.position += dir;
            self.speed = self.max_speed * dir as f32;
            self.steps += 1;
            Ok(StepOutcome::Stepped {
                next_step_in_us: 1000,
            })
        }

        fn position(&self) -> i32 {
            self.position
        }

        fn speed(&self) -> f32 {
            self.speed
        }

        fn initialize(&mut self) -> Result<(), StepperError> {
            self.speed = 0.0;
            self.target = self.position;
            self.initialized += 1;
            Ok(())
        }

        fn disable_motor(&mut self) -> Result<(), StepperError> {
            self.enabled = false;
            Ok(())
        }

        fn setup_controlled_stop(&mut self) {
            self.target = self.position;
            self.controlled_stops += 1;
        }
    }

    /// Delay that only accumulates the requested time
    #[derive(Debug, Default)]
    pub struct RecordingDelay {
        pub total_ns: u64,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    /// Delay that yields to the executor and calls `hook` with the call count
    ///
    /// Lets a test run other futures, or change shared state, between the
    /// steps of a move.
    pub struct HookDelay<F> {
        pub calls: u32,
        pub total_ns: u64,
        hook: F,
    }

    impl<F: FnMut(u32)> HookDelay<F> {
        pub fn new(hook: F) -> Self {
            Self {
                calls: 0,
                total_ns: 0,
                hook,
            }
        }
    }

    impl<F: FnMut(u32)> DelayNs for HookDelay<F> {
        async fn delay_ns(&mut self, ns: u32) {
            self.calls += 1;
            self.total_ns += ns as u64;
            (self.hook)(self.calls);
            embassy_futures::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockStepper, RecordingDelay};
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_move_absolute_runs_to_target() {
        let stepper: SharedStepper<NoopRawMutex, _> = SharedStepper::new(MockStepper {
            max_speed: 100.0,
            ..Default::default()
        });
        let mut delay = RecordingDelay::default();

        let reached = block_on(stepper.move_absolute(5, &mut delay, |_, _| {})).unwrap();

        assert_eq!(reached, 5);
        assert_eq!(stepper.with(|d| d.steps), 5);
        assert_eq!(delay.total_ns, 5 * 1_000_000);
        assert!(stepper.with(|d| d.is_stopped()));
    }

    #[test]
    fn test_move_absolute_reports_every_step() {
        let stepper: SharedStepper<NoopRawMutex, _> = SharedStepper::new(MockStepper {
            max_speed: 50.0,
            position: 3,
            ..Default::default()
        });
        let mut delay = RecordingDelay::default();
        let mut seen: heapless::Vec<(i32, f32), 8> = heapless::Vec::new();

        block_on(stepper.move_absolute(0, &mut delay, |p, v| seen.push((p, v)).unwrap())).unwrap();

        assert_eq!(
            seen.as_slice(),
            &[(2, -50.0), (1, -50.0), (0, -50.0), (0, 0.0)]
        );
    }

    #[test]
    fn test_move_absolute_rejects_zero_speed() {
        let stepper: SharedStepper<NoopRawMutex, _> = SharedStepper::new(MockStepper::default());
        let mut delay = RecordingDelay::default();

        let result = block_on(stepper.move_absolute(10, &mut delay, |_, _| {}));

        assert_eq!(result, Err(StepperError::ZeroSpeed));
        assert_eq!(stepper.position(), 0);
    }

    #[test]
    fn test_move_to_current_position_is_immediate() {
        let stepper: SharedStepper<NoopRawMutex, _> = SharedStepper::new(MockStepper::default());
        stepper.with(|d| d.set_position(42));
        let mut delay = RecordingDelay::default();

        let reached = block_on(stepper.move_absolute(42, &mut delay, |_, _| {})).unwrap();

        assert_eq!(reached, 42);
        assert_eq!(delay.total_ns, 0);
    }
}
