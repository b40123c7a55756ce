//! Error taxonomy for the geolocation engine
//!
//! Only [`ConfigError`] ever aborts a request. [`EstimationError`] is the
//! typed outcome of a single solver and always ends in a centroid fallback;
//! [`SkipReason`] describes a raw record that was dropped during ingestion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for estimator operations
pub type SolveResult<T> = Result<T, EstimationError>;

/// Configuration errors surfaced to the caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `method` is not one of wls, robust, accum, centroid
    #[error("unknown estimation method '{value}' (expected one of: wls, robust, accum, centroid)")]
    UnknownMethod { value: String },

    #[error("invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ConfigError {
    pub fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Numeric conditions that stop a solver early
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degeneracy {
    /// Normal-equation matrix could not be inverted
    #[error("singular normal matrix (determinant {determinant:.3e})")]
    SingularMatrix { determinant: f64 },
    /// Every weight summed to zero
    #[error("total weight is zero")]
    ZeroTotalWeight,
    /// No pair of circles crossed
    #[error("no circle pair intersects")]
    NoIntersections,
    /// Iteration budget was zero
    #[error("no solver iteration ran")]
    NoIterations,
}

/// Why a solver produced no estimate
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EstimationError {
    #[error("insufficient data: {available} points available, {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(Degeneracy),
}

impl From<Degeneracy> for EstimationError {
    fn from(degeneracy: Degeneracy) -> Self {
        EstimationError::NumericDegeneracy(degeneracy)
    }
}

/// Raw log payload could not be decoded at all
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed log payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single raw record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[error("missing latitude or longitude")]
    MissingCoordinates,
    #[error("non-finite latitude or longitude")]
    NonFiniteCoordinates,
    #[error("missing or non-numeric RSSI")]
    NonNumericRssi,
    #[error("missing cell id")]
    MissingTransmitterId,
}
