//! Cell transmitter geolocation
//!
//! Estimates where a cellular transmitter sits from crowdsourced
//! (GPS fix, RSSI) observations. Readings become ranges through a
//! log-distance path-loss model, ranges become circles in a local plane,
//! and one of four estimators turns the circles into a position:
//! weighted least squares, its MAD-robust variant, intersection voting, or
//! a power-weighted centroid that also serves as the fallback for the
//! other three.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{Circle, GeoPoint, IntersectionPoint, Observation, ObservationSet};
pub use algorithms::{CentroidEstimator, PathLossModel, RobustEstimator, VotingClusterer, WeightedLeastSquaresSolver};
pub use api::{estimate_from_records, EstimationOrchestrator, EstimationResult, Outcome};
pub use utils::{EstimationParams, Method};
pub use validation::{ConfigError, EstimationError};
