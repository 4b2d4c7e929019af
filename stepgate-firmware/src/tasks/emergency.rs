//! Emergency task
//!
//! Runs the emergency protocol once per period. It is the only task that
//! drives the stop lamp or suspends motion.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use stepgate_core::emergency::{EmergencyEffects, EmergencyProtocol};
use stepgate_core::led::{LedSignal, LedSink};
use stepgate_core::traits::StepperDriver;
use stepgate_drivers::indicator::StopLamp;

use crate::channels::{Stepper, EMERGENCY, LED_SIGNAL, MOTION_GATE};

/// Board side of the protocol
struct BoardEffects {
    stepper: &'static Stepper,
    lamp: StopLamp<Output<'static>>,
}

impl EmergencyEffects for BoardEffects {
    fn actuator_speed(&mut self) -> f32 {
        self.stepper.speed()
    }

    fn set_stop_lamp(&mut self, on: bool) {
        if self.lamp.is_on() == on {
            return;
        }
        if self.lamp.set(on).is_err() {
            warn!("Stop lamp write failed");
        }
    }

    fn suspend_motion(&mut self) {
        MOTION_GATE.suspend();
    }

    fn resume_motion(&mut self) {
        MOTION_GATE.resume();
    }

    fn hold_motion(&mut self) {
        MOTION_GATE.hold();
    }

    fn halt_driver(&mut self) {
        let result = self.stepper.with(|d| {
            d.initialize()?;
            d.disable_motor()
        });
        if let Err(e) = result {
            error!("Driver halt failed: {:?}", e);
        }
    }

    fn begin_controlled_stop(&mut self) {
        self.stepper.with(|d| d.setup_controlled_stop());
    }

    fn post_led(&mut self, signal: LedSignal) {
        LED_SIGNAL.post(signal);
    }
}

/// Emergency task
#[embassy_executor::task]
pub async fn emergency_task(
    stepper: &'static Stepper,
    lamp: StopLamp<Output<'static>>,
    period: Duration,
    soft_stop_threshold: f32,
) {
    info!("Emergency task started");

    let mut protocol = EmergencyProtocol::new(soft_stop_threshold);
    let mut effects = BoardEffects { stepper, lamp };
    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;

        let incoming = EMERGENCY.try_take();
        if let Some(signal) = incoming {
            info!("Emergency request: {:?}", signal);
        }

        let report = protocol.evaluate(incoming, &mut effects);
        if report.resumed {
            info!("Motion resumed");
        }
        if report.suspended {
            warn!("Soft stop: motion suspended, driver halted");
        }
        if report.hard_stopped {
            warn!("Hard stop: controlled stop started, new moves held");
        }
        if report.deferred {
            trace!("Soft stop deferred, speed {}", effects.stepper.speed());
        }
    }
}
