//! Motion command execution
//!
//! One command is one cycle: push the configuration to the driver, move to
//! the target, then hold for the dwell time. New commands are not looked at
//! until the dwell has elapsed.

use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use super::gate::MotionGate;
use crate::led::{LedSignal, LedSink};
use crate::params::{MotorParameters, SharedParameters};
use crate::traits::{SharedStepper, StepperDriver, StepperError};

/// Phase of the motion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    #[default]
    Idle,
    Configuring,
    Moving,
    Dwelling,
}

/// Result of a completed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveSummary {
    /// Position the driver reported once idle
    pub final_position: i32,
    /// Dwell that followed the move
    pub dwell_ms: u32,
}

/// How a gated cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Nothing arrived in time, or the gate closed while waiting
    NoCommand,
    Completed(MoveSummary),
    /// The driver refused the command
    Rejected(StepperError),
    /// A suspension cancelled the cycle during `phase`
    Suspended { phase: MotionPhase },
}

/// Executes motor commands against a shared stepper
pub struct MotionRunner<'a, M: RawMutex, D> {
    stepper: &'a SharedStepper<M, D>,
    params: &'a SharedParameters<M>,
    phase: MotionPhase,
}

impl<'a, M: RawMutex, D: StepperDriver> MotionRunner<'a, M, D> {
    pub fn new(stepper: &'a SharedStepper<M, D>, params: &'a SharedParameters<M>) -> Self {
        Self {
            stepper,
            params,
            phase: MotionPhase::Idle,
        }
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Drop whatever cycle was in progress
    ///
    /// Called after the cycle future was cancelled by a suspension.
    pub fn abandon(&mut self) {
        self.phase = MotionPhase::Idle;
    }

    /// Wait for an open gate, take one command from `next` and run it
    ///
    /// `next` must be cancel-safe: it is dropped if the gate closes before
    /// it yields a command. The command itself is abandoned if a suspension
    /// arrives while it runs.
    pub async fn cycle<F, L, T>(
        &mut self,
        gate: &MotionGate<M>,
        next: F,
        leds: &L,
        delay: &mut T,
    ) -> CycleOutcome
    where
        F: Future<Output = Option<MotorParameters>>,
        L: LedSink,
        T: DelayNs,
    {
        gate.wait_ready().await;
        let Some(Some(cmd)) = gate.admit(next).await else {
            return CycleOutcome::NoCommand;
        };

        match gate.guard(self.execute(cmd, leds, delay)).await {
            Some(Ok(summary)) => CycleOutcome::Completed(summary),
            Some(Err(e)) => CycleOutcome::Rejected(e),
            None => {
                let phase = self.phase();
                self.abandon();
                CycleOutcome::Suspended { phase }
            }
        }
    }

    /// Run one full cycle for `cmd`
    ///
    /// A rejected move still posts `StopAnimation` but skips the dwell.
    pub async fn execute<L: LedSink, T: DelayNs>(
        &mut self,
        cmd: MotorParameters,
        leds: &L,
        delay: &mut T,
    ) -> Result<MoveSummary, StepperError> {
        self.phase = MotionPhase::Configuring;
        let configured = self.stepper.with(|d| {
            d.set_speed(cmd.rotational_speed);
            d.set_accel(cmd.rotational_accel);
            d.set_decel(cmd.rotational_decel);
            d.set_position(cmd.current_position);
            d.set_step_mode(cmd.step_mode)
        });
        if let Err(e) = configured {
            self.phase = MotionPhase::Idle;
            return Err(e);
        }
        leds.post(LedSignal::StepMode(cmd.step_mode));

        self.phase = MotionPhase::Moving;
        let params = self.params;
        let moved = self
            .stepper
            .move_absolute(cmd.target_position(), delay, |position, speed| {
                params.record_feedback(position, speed)
            })
            .await;
        leds.post(LedSignal::StopAnimation);

        let final_position = match moved {
            Ok(position) => position,
            Err(e) => {
                self.phase = MotionPhase::Idle;
                return Err(e);
            }
        };

        self.phase = MotionPhase::Dwelling;
        delay.delay_ms(cmd.dwell_time_ms).await;
        self.phase = MotionPhase::Idle;

        Ok(MoveSummary {
            final_position,
            dwell_ms: cmd.dwell_time_ms,
        })
    }
}
