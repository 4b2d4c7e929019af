//! Emergency-stop precedence protocol
//!
//! Evaluated once per emergency period. The checks always run in this order:
//!
//! 1. Resume: clear everything, lamp off, resume motion. Ends the cycle.
//! 2. Blink: write the lamp phase, then toggle it. Stays set.
//! 3. Soft stop: while the actuator is faster than the threshold, end the
//!    cycle and try again next period. Otherwise suspend motion and halt the
//!    driver.
//! 4. Hard stop: replace the signal with soft stop + blink, hold motion so
//!    no further command starts, flag the LEDs and start a controlled
//!    ramp-down. Ends the cycle.
//!
//! A hard stop therefore always turns into a real suspend once the ramp has
//! brought the speed under the threshold.

use crate::led::LedSignal;

use super::signal::EmergencySignal;

/// Default speed (steps/s) under which a soft stop may suspend motion
pub const DEFAULT_SOFT_STOP_THRESHOLD: f32 = 3.0;

/// Side effects of the emergency protocol
///
/// Implementations report driver failures themselves; nothing here returns
/// an error to the protocol.
pub trait EmergencyEffects {
    /// Current signed actuator speed in steps/s
    fn actuator_speed(&mut self) -> f32;

    /// Drive the stop lamp
    fn set_stop_lamp(&mut self, on: bool);

    /// Park the motion task, abandoning its current cycle
    fn suspend_motion(&mut self);

    /// Let the motion task run again
    fn resume_motion(&mut self);

    /// Stop the motion task from taking new commands until it is
    /// suspended or resumed
    fn hold_motion(&mut self);

    /// Re-initialize the driver and de-energize the windings
    fn halt_driver(&mut self);

    /// Start the driver's controlled stop ramp
    fn begin_controlled_stop(&mut self);

    /// Post a status signal to the LED task
    fn post_led(&mut self, signal: LedSignal);
}

/// What one evaluation cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    pub resumed: bool,
    pub blinked: bool,
    /// Soft stop postponed because the actuator was too fast
    pub deferred: bool,
    pub suspended: bool,
    pub hard_stopped: bool,
}

impl CycleReport {
    /// Check if the cycle did anything
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Emergency protocol state
#[derive(Debug, Clone, Copy)]
pub struct EmergencyProtocol {
    signal: EmergencySignal,
    lamp_phase: bool,
    threshold: f32,
}

impl EmergencyProtocol {
    pub const fn new(threshold: f32) -> Self {
        Self {
            signal: EmergencySignal::NONE,
            lamp_phase: true,
            threshold,
        }
    }

    /// Signal currently held
    pub fn signal(&self) -> EmergencySignal {
        self.signal
    }

    /// Run one cycle
    ///
    /// A newly received signal replaces the held one; with no new signal the
    /// held one is evaluated again.
    pub fn evaluate<E: EmergencyEffects>(
        &mut self,
        incoming: Option<EmergencySignal>,
        effects: &mut E,
    ) -> CycleReport {
        if let Some(signal) = incoming {
            self.signal = signal;
        }

        let mut report = CycleReport::default();
        if self.signal.is_empty() {
            return report;
        }

        if self.signal.resume {
            self.signal = EmergencySignal::NONE;
            effects.set_stop_lamp(false);
            effects.resume_motion();
            report.resumed = true;
            return report;
        }

        if self.signal.blink {
            effects.set_stop_lamp(self.lamp_phase);
            self.lamp_phase = !self.lamp_phase;
            report.blinked = true;
        }

        if self.signal.soft_stop {
            let speed = effects.actuator_speed();
            if speed.abs() > self.threshold {
                report.deferred = true;
                return report;
            }
            self.signal.soft_stop = false;
            self.signal.resume = false;
            effects.suspend_motion();
            effects.halt_driver();
            report.suspended = true;
        }

        if self.signal.stop {
            self.signal = EmergencySignal::REARMED;
            effects.hold_motion();
            effects.post_led(LedSignal::EmergencyStop);
            effects.begin_controlled_stop();
            report.hard_stopped = true;
        }

        report
    }
}

impl Default for EmergencyProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_SOFT_STOP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Effect {
        Lamp(bool),
        Suspend,
        Resume,
        Hold,
        Halt,
        ControlledStop,
        Led(LedSignal),
    }

    struct Recorder {
        speed: f32,
        log: Vec<Effect, 16>,
    }

    impl Recorder {
        fn new(speed: f32) -> Self {
            Self {
                speed,
                log: Vec::new(),
            }
        }

        fn take(&mut self) -> Vec<Effect, 16> {
            core::mem::take(&mut self.log)
        }
    }

    impl EmergencyEffects for Recorder {
        fn actuator_speed(&mut self) -> f32 {
            self.speed
        }

        fn set_stop_lamp(&mut self, on: bool) {
            self.log.push(Effect::Lamp(on)).unwrap();
        }

        fn suspend_motion(&mut self) {
            self.log.push(Effect::Suspend).unwrap();
        }

        fn resume_motion(&mut self) {
            self.log.push(Effect::Resume).unwrap();
        }

        fn hold_motion(&mut self) {
            self.log.push(Effect::Hold).unwrap();
        }

        fn halt_driver(&mut self) {
            self.log.push(Effect::Halt).unwrap();
        }

        fn begin_controlled_stop(&mut self) {
            self.log.push(Effect::ControlledStop).unwrap();
        }

        fn post_led(&mut self, signal: LedSignal) {
            self.log.push(Effect::Led(signal)).unwrap();
        }
    }

    #[test]
    fn test_empty_signal_does_nothing() {
        let mut protocol = EmergencyProtocol::default();
        let mut fx = Recorder::new(0.0);

        let report = protocol.evaluate(None, &mut fx);

        assert!(report.is_idle());
        assert!(fx.log.is_empty());
    }

    #[test]
    fn test_resume_is_exclusive() {
        let mut protocol = EmergencyProtocol::default();
        let mut fx = Recorder::new(0.0);
        let everything = EmergencySignal::from_bits(0x33);

        let report = protocol.evaluate(Some(everything), &mut fx);

        assert_eq!(
            report,
            CycleReport {
                resumed: true,
                ..Default::default()
            }
        );
        assert_eq!(fx.log.as_slice(), &[Effect::Lamp(false), Effect::Resume]);
        assert!(protocol.signal().is_empty());
    }

    #[test]
    fn test_hard_stop_rearms_then_suspends_when_slow() {
        let mut protocol = EmergencyProtocol::default();
        let mut fx = Recorder::new(250.0);

        let report = protocol.evaluate(Some(EmergencySignal::STOP), &mut fx);
        assert!(report.hard_stopped);
        assert_eq!(protocol.signal().to_bits(), 0x30);
        assert_eq!(
            fx.take().as_slice(),
            &[
                Effect::Hold,
                Effect::Led(LedSignal::EmergencyStop),
                Effect::ControlledStop
            ]
        );

        // Still ramping down: lamp blinks, suspend is deferred
        let report = protocol.evaluate(None, &mut fx);
        assert!(report.blinked && report.deferred && !report.suspended);
        assert_eq!(fx.take().as_slice(), &[Effect::Lamp(true)]);
        assert_eq!(protocol.signal(), EmergencySignal::REARMED);

        fx.speed = -2.5;
        let report = protocol.evaluate(None, &mut fx);
        assert!(report.suspended);
        assert_eq!(
            fx.take().as_slice(),
            &[Effect::Lamp(false), Effect::Suspend, Effect::Halt]
        );
        assert_eq!(protocol.signal(), EmergencySignal::BLINK);

        // Lamp keeps blinking until resumed
        protocol.evaluate(None, &mut fx);
        assert_eq!(fx.take().as_slice(), &[Effect::Lamp(true)]);
        protocol.evaluate(Some(EmergencySignal::RESUME), &mut fx);
        assert_eq!(fx.take().as_slice(), &[Effect::Lamp(false), Effect::Resume]);
    }

    #[test]
    fn test_soft_stop_deferred_above_threshold() {
        let mut protocol = EmergencyProtocol::default();
        let mut fx = Recorder::new(-3.5);

        let report = protocol.evaluate(Some(EmergencySignal::SOFT_STOP), &mut fx);

        assert!(report.deferred);
        assert!(fx.log.is_empty());
        assert_eq!(protocol.signal(), EmergencySignal::SOFT_STOP);
    }

    #[test]
    fn test_soft_stop_at_threshold_suspends() {
        let mut protocol = EmergencyProtocol::new(3.0);
        let mut fx = Recorder::new(3.0);

        let report = protocol.evaluate(Some(EmergencySignal::SOFT_STOP), &mut fx);

        assert!(report.suspended);
        assert!(protocol.signal().is_empty());
    }

    #[test]
    fn test_slow_stop_suspends_and_rearms_in_one_cycle() {
        let mut protocol = EmergencyProtocol::default();
        let mut fx = Recorder::new(0.0);
        let signal = EmergencySignal::STOP.union(EmergencySignal::SOFT_STOP);

        let report = protocol.evaluate(Some(signal), &mut fx);

        assert!(report.suspended && report.hard_stopped);
        assert_eq!(
            fx.log.as_slice(),
            &[
                Effect::Suspend,
                Effect::Halt,
                Effect::Hold,
                Effect::Led(LedSignal::EmergencyStop),
                Effect::ControlledStop
            ]
        );
        assert_eq!(protocol.signal(), EmergencySignal::REARMED);
    }

    #[test]
    fn test_new_signal_replaces_held() {
        let mut protocol = EmergencyProtocol::default();
        let mut fx = Recorder::new(100.0);
        protocol.evaluate(Some(EmergencySignal::SOFT_STOP), &mut fx);

        protocol.evaluate(Some(EmergencySignal::BLINK), &mut fx);

        assert_eq!(protocol.signal(), EmergencySignal::BLINK);
    }
}
