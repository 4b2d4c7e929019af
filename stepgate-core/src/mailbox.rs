//! Mailboxes connecting the control tasks
//!
//! Single-slot mailboxes (buttons, LED signal, emergency) are plain
//! `embassy_sync::signal::Signal`s: a new value overwrites the pending one.
//! The motor command path is a bounded FIFO that never blocks the producer.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;

use crate::params::MotorParameters;

/// Pending motor commands the queue holds before dropping new ones
pub const MOTOR_QUEUE_DEPTH: usize = 25;

/// Motor command queue as used by the firmware
pub type MotorQueue<M> = CommandQueue<M, MotorParameters, MOTOR_QUEUE_DEPTH>;

/// Result of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnqueueOutcome {
    /// The command was queued
    Queued,
    /// The queue was full; the new command was discarded
    Dropped,
}

/// Bounded FIFO with a drop-newest overflow policy
pub struct CommandQueue<M: RawMutex, T, const N: usize> {
    channel: Channel<M, T, N>,
    dropped: Mutex<M, Cell<u32>>,
}

impl<M: RawMutex, T, const N: usize> CommandQueue<M, T, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: Mutex::new(Cell::new(0)),
        }
    }

    /// Enqueue without waiting
    ///
    /// Entries already queued are never disturbed; on overflow the new
    /// command is the one lost.
    pub fn post(&self, item: T) -> EnqueueOutcome {
        match self.channel.try_send(item) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(_) => {
                self.dropped
                    .lock(|count| count.set(count.get().saturating_add(1)));
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Wait for the oldest command
    pub async fn receive(&self) -> T {
        self.channel.receive().await
    }

    /// Take the oldest command if one is pending
    pub fn try_receive(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Total commands dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped.lock(|count| count.get())
    }
}

impl<M: RawMutex, T, const N: usize> Default for CommandQueue<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn command(dwell: u32) -> MotorParameters {
        MotorParameters {
            dwell_time_ms: dwell,
            ..MotorParameters::new()
        }
    }

    #[test]
    fn test_overflow_drops_newest_and_keeps_order() {
        let queue = MotorQueue::<NoopRawMutex>::new();

        for i in 0..MOTOR_QUEUE_DEPTH as u32 {
            assert_eq!(queue.post(command(i)), EnqueueOutcome::Queued);
        }
        assert_eq!(queue.post(command(999)), EnqueueOutcome::Dropped);
        assert_eq!(queue.len(), MOTOR_QUEUE_DEPTH);
        assert_eq!(queue.dropped(), 1);

        for i in 0..MOTOR_QUEUE_DEPTH as u32 {
            assert_eq!(queue.try_receive().map(|c| c.dwell_time_ms), Some(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_receive_returns_oldest() {
        let queue = CommandQueue::<NoopRawMutex, u8, 4>::new();
        queue.post(1);
        queue.post(2);

        assert_eq!(block_on(queue.receive()), 1);
        assert_eq!(queue.try_receive(), Some(2));
        assert_eq!(queue.try_receive(), None);
    }
}
