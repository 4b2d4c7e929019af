//! Suspension gate for the motion task
//!
//! The gate has three states:
//!
//! - open: commands are taken and run
//! - held: a hard stop is ramping down; the move in flight finishes its
//!   stop ramp but no new command is taken
//! - suspended: the cycle in flight is cancelled at its next await point
//!
//! A hold ends when the emergency task suspends or resumes motion.

use core::cell::Cell;
use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GateState {
    suspended: bool,
    held: bool,
}

impl GateState {
    const OPEN: Self = Self {
        suspended: false,
        held: false,
    };

    fn is_open(self) -> bool {
        !self.suspended && !self.held
    }
}

/// Suspended/held/open flag with change notification
///
/// The emergency task flips the flag; the motion task races its work
/// against the gate so a suspension takes effect at the next await point of
/// whatever it is doing. Only one task may wait on the gate.
pub struct MotionGate<M: RawMutex> {
    state: Mutex<M, Cell<GateState>>,
    changed: Signal<M, ()>,
}

impl<M: RawMutex> MotionGate<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(GateState::OPEN)),
            changed: Signal::new(),
        }
    }

    /// Cancel the current cycle and park the motion task
    pub fn suspend(&self) {
        self.set(GateState {
            suspended: true,
            held: false,
        });
    }

    /// Open the gate again
    pub fn resume(&self) {
        self.set(GateState::OPEN);
    }

    /// Stop taking new commands, letting the current move run out
    pub fn hold(&self) {
        let state = self.state();
        self.set(GateState {
            held: true,
            ..state
        });
    }

    pub fn is_suspended(&self) -> bool {
        self.state().suspended
    }

    pub fn is_held(&self) -> bool {
        self.state().held
    }

    fn state(&self) -> GateState {
        self.state.lock(|s| s.get())
    }

    fn set(&self, state: GateState) {
        self.state.lock(|s| s.set(state));
        self.changed.signal(());
    }

    async fn wait_for(&self, done: impl Fn(GateState) -> bool) {
        while !done(self.state()) {
            self.changed.wait().await;
        }
    }

    /// Wait until the gate is in the requested suspension state
    async fn wait_until(&self, suspended: bool) {
        self.wait_for(|s| s.suspended == suspended).await;
    }

    /// Wait until the gate is neither suspended nor held
    pub async fn wait_ready(&self) {
        self.wait_for(GateState::is_open).await;
    }

    /// Run `work` unless the gate gets suspended first
    ///
    /// Returns `None` when the work was cancelled by a suspension. A hold
    /// does not cancel.
    pub async fn guard<F: Future>(&self, work: F) -> Option<F::Output> {
        match select(self.wait_until(true), work).await {
            Either::First(()) => None,
            Either::Second(output) => Some(output),
        }
    }

    /// Run `work` only while the gate stays open
    ///
    /// Returns `None` if the gate is closed already or closes (held or
    /// suspended) before `work` completes. Meant for cancel-safe work such as
    /// a queue receive.
    pub async fn admit<F: Future>(&self, work: F) -> Option<F::Output> {
        match select(self.wait_for(|s| !s.is_open()), work).await {
            Either::First(()) => None,
            Either::Second(output) => Some(output),
        }
    }
}

impl<M: RawMutex> Default for MotionGate<M> {
    fn default() -> Self {
        Self::new()
    }
}
