//! Parameter store shared between the HTTP endpoint, the buttons and the
//! motion task

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::motor::{DriverFeedback, MotorParameters};
use super::query::{merge_into, MergeReport};

/// The persistent motion configuration plus the latest driver feedback
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterStore {
    params: MotorParameters,
    feedback: DriverFeedback,
}

impl ParameterStore {
    /// Create a store with all fields zeroed
    pub const fn new() -> Self {
        Self {
            params: MotorParameters::new(),
            feedback: DriverFeedback {
                position: 0,
                speed: 0.0,
            },
        }
    }

    /// Copy of the current parameters
    pub fn snapshot(&self) -> MotorParameters {
        self.params
    }

    /// Merge a query string and return the resulting snapshot
    pub fn merge_query(&mut self, query: &str) -> (MotorParameters, MergeReport) {
        let report = merge_into(&mut self.params, query);
        (self.params, report)
    }

    /// Store the latest driver feedback
    pub fn record_feedback(&mut self, position: i32, speed: f32) {
        self.feedback = DriverFeedback { position, speed };
    }

    /// Latest driver feedback
    pub fn feedback(&self) -> DriverFeedback {
        self.feedback
    }
}

/// [`ParameterStore`] behind a blocking mutex
///
/// A merge and the snapshot it returns happen in one critical section, so
/// a reader never sees a half-applied query.
pub struct SharedParameters<M: RawMutex> {
    inner: Mutex<M, RefCell<ParameterStore>>,
}

impl<M: RawMutex> SharedParameters<M> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ParameterStore::new())),
        }
    }

    pub fn snapshot(&self) -> MotorParameters {
        self.inner.lock(|s| s.borrow().snapshot())
    }

    pub fn merge_query(&self, query: &str) -> (MotorParameters, MergeReport) {
        self.inner.lock(|s| s.borrow_mut().merge_query(query))
    }

    pub fn record_feedback(&self, position: i32, speed: f32) {
        self.inner
            .lock(|s| s.borrow_mut().record_feedback(position, speed))
    }

    pub fn feedback(&self) -> DriverFeedback {
        self.inner.lock(|s| s.borrow().feedback())
    }

    /// Snapshot and feedback read together
    pub fn status(&self) -> (MotorParameters, DriverFeedback) {
        self.inner.lock(|s| {
            let store = s.borrow();
            (store.snapshot(), store.feedback())
        })
    }
}

impl<M: RawMutex> Default for SharedParameters<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::StepMode;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_merge_keeps_absent_fields() {
        let store = SharedParameters::<NoopRawMutex>::new();
        store.merge_query("rs=100&dt=250");
        let (after, _) = store.merge_query("sm=1");

        assert_eq!(after.rotational_speed, 100.0);
        assert_eq!(after.dwell_time_ms, 250);
        assert_eq!(after.step_mode, StepMode::Half);
        assert_eq!(store.snapshot(), after);
    }

    #[test]
    fn test_feedback_is_separate_from_params() {
        let store = SharedParameters::<NoopRawMutex>::new();
        store.record_feedback(512, -40.0);

        let (params, feedback) = store.status();
        assert_eq!(params, MotorParameters::new());
        assert_eq!(feedback.position, 512);
        assert_eq!(feedback.direction(), 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut store = ParameterStore::new();
        let before = store.snapshot();
        store.merge_query("fis=10");
        assert_eq!(before.final_position, 0);
        assert_eq!(store.snapshot().final_position, 10);
    }
}
