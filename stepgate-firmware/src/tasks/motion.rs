//! Motion task
//!
//! Waits for motor commands and runs them one cycle at a time. The emergency
//! task can hold it (no new commands) or suspend it at any point; a suspended
//! cycle is abandoned, not resumed.

use defmt::*;
use embassy_time::{with_timeout, Delay, Duration};

use stepgate_core::motion::{CycleOutcome, MotionRunner};
use stepgate_core::params::MotorParameters;

use crate::channels::{Stepper, LED_SIGNAL, MOTION_GATE, MOTOR_COMMANDS, PARAMETERS};

/// Motion task
///
/// `poll` bounds how long the task waits on an empty queue before checking
/// the gate again.
#[embassy_executor::task]
pub async fn motion_task(stepper: &'static Stepper, poll: Duration) {
    info!("Motion task started");

    let mut runner = MotionRunner::new(stepper, &PARAMETERS);
    let mut delay = Delay;

    loop {
        match runner
            .cycle(&MOTION_GATE, next_command(poll), &LED_SIGNAL, &mut delay)
            .await
        {
            CycleOutcome::NoCommand => {}
            CycleOutcome::Completed(summary) => {
                debug!(
                    "Move done at {}, dwelled {}ms",
                    summary.final_position, summary.dwell_ms
                );
            }
            CycleOutcome::Rejected(e) => {
                error!("Move rejected by driver: {:?}", e);
            }
            CycleOutcome::Suspended { phase } => {
                warn!("Motion suspended during {:?}, cycle abandoned", phase);
            }
        }
    }
}

/// Take one command, if any arrives within `poll`
async fn next_command(poll: Duration) -> Option<MotorParameters> {
    let cmd = with_timeout(poll, MOTOR_COMMANDS.receive()).await.ok()?;

    info!(
        "Move {} -> {} at {} steps/s ({:?})",
        cmd.current_position,
        cmd.target_position(),
        cmd.rotational_speed,
        cmd.step_mode
    );

    Some(cmd)
}
