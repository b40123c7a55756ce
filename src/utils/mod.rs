//! Configuration

pub mod config;

pub use config::{ConfigurationManager, EstimationParams, Method, ParameterOverrides, TimeWindow};
