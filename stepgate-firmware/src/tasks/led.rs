//! Status LED task

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use stepgate_core::led::LedRenderer;

use crate::channels::{StatusLeds, LED_SIGNAL};

/// LED task
///
/// Applies status signals as they arrive and advances the step mode
/// animation once per frame.
#[embassy_executor::task]
pub async fn led_task(mut leds: StatusLeds, frame: Duration) {
    info!("LED task started");

    let mut renderer = LedRenderer::new();
    let mut ticker = Ticker::every(frame);

    loop {
        let changed = match select(LED_SIGNAL.wait(), ticker.next()).await {
            Either::First(signal) => {
                debug!("LED signal: {:?} (wire {})", signal, signal.to_wire());
                renderer.apply(signal);
                true
            }
            Either::Second(()) => false,
        };

        // Static patterns only need writing once
        let pattern = renderer.tick();
        if (changed || renderer.is_animating()) && leds.write(pattern).is_err() {
            warn!("LED write failed");
        }
    }
}
