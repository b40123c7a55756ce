//! Error types

pub mod error;

pub use error::{ConfigError, Degeneracy, EstimationError, IngestError, SkipReason, SolveResult};
