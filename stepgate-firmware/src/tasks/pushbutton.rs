//! Pushbutton sampling task
//!
//! Samples the panel buttons every period and publishes the raw pattern.
//! Edge detection happens in the button task.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::{PanelButtons, BUTTONS};

/// Pushbutton task
#[embassy_executor::task]
pub async fn pushbutton_task(mut buttons: PanelButtons, period: Duration) {
    info!("Pushbutton task started");

    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;

        match buttons.sample() {
            Ok(pattern) => BUTTONS.signal(pattern),
            Err(_) => warn!("Button read failed"),
        }
    }
}
