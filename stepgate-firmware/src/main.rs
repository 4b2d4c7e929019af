//! Stepgate - Stepper Motion Gatekeeper Firmware
//!
//! Main firmware binary for the Raspberry Pi Pico W controller. Moves are
//! requested over HTTP or replayed from the panel, and every move passes the
//! emergency gate before it reaches the driver.
//!
//! Pin map:
//!
//! | Function | Pins |
//! |---|---|
//! | Stepper STEP / DIR / EN / MS1 / MS2 | GP10 / GP11 / GP12 / GP13 / GP14 |
//! | Stop lamp | GP15 |
//! | Green status LEDs | GP6-GP9 |
//! | Buttons (stop, resume, soft stop, replay) | GP16-GP19, to ground |
//! | CYW43439 | GP23, GP24, GP25, GP29 |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_time::Duration;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stepgate_core::traits::SharedStepper;
use stepgate_drivers::buttons::ButtonBank;
use stepgate_drivers::indicator::{LedBank, StopLamp};
use stepgate_drivers::stepper::{GpioStepper, GpioStepperConfig};

use crate::channels::Stepper;
use crate::network::WifiPeripherals;

mod channels;
mod config;
mod network;
mod tasks;

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

static STEPPER: StaticCell<Stepper> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stepgate firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config = config::load_config();
    let timing = config.timing;

    // Driver starts de-energized until the first move
    let driver = unwrap!(GpioStepper::new(
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_12, Level::High),
        Output::new(p.PIN_13, Level::Low),
        Output::new(p.PIN_14, Level::Low),
        GpioStepperConfig::default(),
    ));
    let stepper: &'static Stepper = STEPPER.init(SharedStepper::new(driver));

    let lamp = unwrap!(StopLamp::new(Output::new(p.PIN_15, Level::Low)));

    let leds = unwrap!(LedBank::new([
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
    ]));

    let buttons = ButtonBank::new([
        Input::new(p.PIN_16, Pull::Up),
        Input::new(p.PIN_17, Pull::Up),
        Input::new(p.PIN_18, Pull::Up),
        Input::new(p.PIN_19, Pull::Up),
    ]);

    info!("Hardware initialized");

    unwrap!(spawner.spawn(tasks::emergency_task(
        stepper,
        lamp,
        ms(timing.emergency_period_ms),
        config.safety.soft_stop_speed_threshold,
    )));
    unwrap!(spawner.spawn(tasks::motion_task(stepper, ms(timing.motion_poll_ms))));
    unwrap!(spawner.spawn(tasks::led_task(leds, ms(timing.led_frame_ms))));
    unwrap!(spawner.spawn(tasks::pushbutton_task(buttons, ms(timing.button_poll_ms))));
    unwrap!(spawner.spawn(tasks::button_task()));

    let wifi = WifiPeripherals {
        pwr: p.PIN_23,
        dio: p.PIN_24,
        cs: p.PIN_25,
        clk: p.PIN_29,
        pio: p.PIO0,
        dma: p.DMA_CH0,
    };
    if let Some(stack) = network::start(spawner, &config.wifi, &config.network, wifi).await {
        unwrap!(spawner.spawn(tasks::http_task(stack, config.network.port)));
    }

    info!("All tasks spawned");
}

fn ms(value: u32) -> Duration {
    Duration::from_millis(value as u64)
}
