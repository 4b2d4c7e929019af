//! Motor parameters
//!
//! The parameter record, the query-string merge and the shared store.

pub mod motor;
pub mod query;
pub mod store;

pub use motor::{DriverFeedback, MotorParameters, StepMode};
pub use query::{MergeDiagnostic, MergeReport, ParamKey};
pub use store::{ParameterStore, SharedParameters};
