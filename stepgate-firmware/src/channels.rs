//! Inter-task communication channels
//!
//! Every task talks to the others through the statics defined here. The
//! stepper itself is created at runtime in `main` and handed out by
//! reference.

use embassy_rp::gpio::{Input, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use stepgate_core::buttons::BUTTON_COUNT;
use stepgate_core::emergency::EmergencySignal;
use stepgate_core::led::{LedSignal, LED_COUNT};
use stepgate_core::mailbox::MotorQueue;
use stepgate_core::motion::MotionGate;
use stepgate_core::params::SharedParameters;
use stepgate_core::traits::SharedStepper;
use stepgate_drivers::buttons::ButtonBank;
use stepgate_drivers::indicator::LedBank;
use stepgate_drivers::stepper::GpioStepper;

/// STEP, DIR, EN, MS1, MS2
pub type BoardStepper = GpioStepper<
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
>;

/// Stepper shared by the motion and emergency tasks
pub type Stepper = SharedStepper<CriticalSectionRawMutex, BoardStepper>;

/// Panel buttons, GP16-GP19
pub type PanelButtons = ButtonBank<Input<'static>, { BUTTON_COUNT as usize }>;

/// Green status LEDs, GP6-GP9
pub type StatusLeds = LedBank<Output<'static>, { LED_COUNT as usize }>;

/// Raw button pattern from the pushbutton sampler (latest wins)
pub static BUTTONS: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Pending motor commands, fed by HTTP and the replay button
pub static MOTOR_COMMANDS: MotorQueue<CriticalSectionRawMutex> = MotorQueue::new();

/// Status for the green LEDs (latest wins)
pub static LED_SIGNAL: Signal<CriticalSectionRawMutex, LedSignal> = Signal::new();

/// Emergency request for the next protocol cycle (latest wins)
pub static EMERGENCY: Signal<CriticalSectionRawMutex, EmergencySignal> = Signal::new();

/// Last accepted motor parameters plus driver feedback
pub static PARAMETERS: SharedParameters<CriticalSectionRawMutex> = SharedParameters::new();

/// Suspension flag for the motion task
pub static MOTION_GATE: MotionGate<CriticalSectionRawMutex> = MotionGate::new();
