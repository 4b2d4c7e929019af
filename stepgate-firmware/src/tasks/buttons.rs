//! Button dispatch task
//!
//! Turns button presses into emergency requests and motion replays.

use defmt::*;

use stepgate_core::buttons::ButtonDispatcher;
use stepgate_core::mailbox::EnqueueOutcome;

use crate::channels::{BUTTONS, EMERGENCY, MOTOR_COMMANDS, PARAMETERS};

/// Button task
#[embassy_executor::task]
pub async fn button_task() {
    info!("Button task started");

    let mut dispatcher = ButtonDispatcher::new();

    loop {
        let pattern = BUTTONS.wait().await;
        let actions = dispatcher.dispatch(pattern);
        if actions.is_empty() {
            continue;
        }

        if let Some(signal) = actions.emergency {
            info!("Button emergency request: {:?}", signal);
            EMERGENCY.signal(signal);
        }

        if actions.replay {
            let params = PARAMETERS.snapshot();
            match MOTOR_COMMANDS.post(params) {
                EnqueueOutcome::Queued => info!("Replaying last move to {}", params.final_position),
                EnqueueOutcome::Dropped => {
                    warn!("Motor queue full, replay dropped ({} total)", MOTOR_COMMANDS.dropped())
                }
            }
        }
    }
}
