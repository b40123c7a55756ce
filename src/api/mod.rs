//! Estimation entry points and result types

pub mod estimator;
pub mod types;

pub use estimator::{estimate_from_records, BatchEstimate, EstimationOrchestrator};
pub use types::{DebugCircle, DebugPayload, EstimationResult, Outcome};
