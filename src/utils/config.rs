use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::algorithms::path_loss::PathLossModel;
use crate::algorithms::robust::DEFAULT_ROBUST_K;
use crate::algorithms::wls::{DEFAULT_CONVERGENCE_M, DEFAULT_MAX_ITERATIONS};
use crate::validation::error::ConfigError;

/// Estimation strategy, resolved once at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Method {
    /// Gauss–Newton weighted least squares
    #[default]
    Wls,
    /// WLS with MAD outlier rejection
    Robust,
    /// Pairwise-intersection voting
    Accum,
    /// Power-weighted centroid
    Centroid,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Wls, Method::Robust, Method::Accum, Method::Centroid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Wls => "wls",
            Method::Robust => "robust",
            Method::Accum => "accum",
            Method::Centroid => "centroid",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownMethod { value: s.to_string() })
    }
}

impl TryFrom<String> for Method {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Unix-seconds time window; `start` inclusive, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl TimeWindow {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Untimestamped records only pass an unbounded window
    pub fn contains(&self, timestamp: Option<i64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(ts) = timestamp else {
            return false;
        };
        self.start.map_or(true, |start| ts >= start) && self.end.map_or(true, |end| ts < end)
    }
}

/// Flat parameter set for one estimation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationParams {
    /// Path-loss exponent
    pub ple: f64,
    /// RSSI at the reference distance (dBm)
    pub ref_rssi: f64,
    /// Reference distance (m)
    pub ref_dist: f64,
    /// Accum clustering radius (m)
    pub bandwidth_m: f64,
    pub method: Method,
    /// Attach diagnostic circles to each result
    pub debug: bool,
    pub max_iter: usize,
    pub convergence_threshold_m: f64,
    /// Inlier cutoff in robust standard deviations
    pub robust_k: f64,
    pub window: Option<TimeWindow>,
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            ple: 2.0,
            ref_rssi: -40.0,
            ref_dist: 1.0,
            bandwidth_m: 150.0,
            method: Method::Wls,
            debug: false,
            max_iter: DEFAULT_MAX_ITERATIONS,
            convergence_threshold_m: DEFAULT_CONVERGENCE_M,
            robust_k: DEFAULT_ROBUST_K,
            window: None,
        }
    }
}

impl EstimationParams {
    pub fn path_loss_model(&self) -> PathLossModel {
        PathLossModel::new(self.ple, self.ref_rssi, self.ref_dist)
    }

    /// Reject values no algorithm can clamp into something meaningful
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("ple", self.ple),
            ("ref_rssi", self.ref_rssi),
            ("ref_dist", self.ref_dist),
            ("bandwidth_m", self.bandwidth_m),
            ("convergence_threshold_m", self.convergence_threshold_m),
            ("robust_k", self.robust_k),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::invalid(name, value, "must be a finite number"));
            }
        }

        if self.ref_dist <= 0.0 {
            return Err(ConfigError::invalid("ref_dist", self.ref_dist, "reference distance must be positive"));
        }
        if self.convergence_threshold_m < 0.0 {
            return Err(ConfigError::invalid(
                "convergence_threshold_m",
                self.convergence_threshold_m,
                "convergence threshold cannot be negative",
            ));
        }
        if self.robust_k <= 0.0 {
            return Err(ConfigError::invalid("robust_k", self.robust_k, "inlier cutoff must be positive"));
        }
        if let Some(TimeWindow { start: Some(start), end: Some(end) }) = self.window {
            if end <= start {
                return Err(ConfigError::invalid(
                    "window",
                    format!("{}..{}", start, end),
                    "window end must be after its start",
                ));
            }
        }
        Ok(())
    }
}

/// Holds the active parameters and their backing file
#[derive(Debug, Clone, Default)]
pub struct ConfigurationManager {
    params: EstimationParams,
    is_modified: bool,
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager and load parameters from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn params(&self) -> &EstimationParams {
        &self.params
    }

    pub fn into_params(self) -> EstimationParams {
        self.params
    }

    /// Load parameters from a JSON file; absent fields keep their defaults
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let raw: serde_json::Value = serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        // Unknown method names are reported as UnknownMethod
        if let Some(method) = raw.get("method").and_then(serde_json::Value::as_str) {
            method.parse::<Method>()?;
        }

        let params: EstimationParams = serde_json::from_value(raw).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        params.validate()?;

        self.params = params;
        self.is_modified = false;
        Ok(())
    }

    /// Save parameters as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.params).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.is_modified = false;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Apply overrides atomically: either every override lands or none does.
    /// Returns a description of each change.
    pub fn apply_overrides(&mut self, overrides: &ParameterOverrides) -> Result<Vec<String>, ConfigError> {
        let mut next = self.params.clone();
        let mut applied = Vec::new();

        if let Some(raw) = &overrides.method {
            let method: Method = raw.parse()?;
            applied.push(format!("method: {} -> {}", next.method, method));
            next.method = method;
        }
        if let Some(ple) = overrides.ple {
            applied.push(format!("ple: {} -> {}", next.ple, ple));
            next.ple = ple;
        }
        if let Some(ref_rssi) = overrides.ref_rssi {
            applied.push(format!("ref_rssi: {} -> {}", next.ref_rssi, ref_rssi));
            next.ref_rssi = ref_rssi;
        }
        if let Some(ref_dist) = overrides.ref_dist {
            applied.push(format!("ref_dist: {} -> {}", next.ref_dist, ref_dist));
            next.ref_dist = ref_dist;
        }
        if let Some(bandwidth_m) = overrides.bandwidth_m {
            applied.push(format!("bandwidth_m: {} -> {}", next.bandwidth_m, bandwidth_m));
            next.bandwidth_m = bandwidth_m;
        }
        if let Some(debug) = overrides.debug {
            applied.push(format!("debug: {} -> {}", next.debug, debug));
            next.debug = debug;
        }
        if overrides.since.is_some() || overrides.until.is_some() {
            let mut window = next.window.unwrap_or_default();
            if overrides.since.is_some() {
                window.start = overrides.since;
            }
            if overrides.until.is_some() {
                window.end = overrides.until;
            }
            applied.push(format!("window: {:?}..{:?}", window.start, window.end));
            next.window = Some(window);
        }

        next.validate()?;
        if !applied.is_empty() {
            self.params = next;
            self.is_modified = true;
        }
        Ok(applied)
    }
}

/// Optional per-request parameter overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterOverrides {
    /// Raw method name, parsed when applied
    pub method: Option<String>,
    pub ple: Option<f64>,
    pub ref_rssi: Option<f64>,
    pub ref_dist: Option<f64>,
    pub bandwidth_m: Option<f64>,
    pub debug: Option<bool>,
    pub since: Option<i64>,
    pub until: Option<i64>,
}

impl ParameterOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_ple(mut self, ple: f64) -> Self {
        self.ple = Some(ple);
        self
    }

    pub fn with_ref_rssi(mut self, ref_rssi: f64) -> Self {
        self.ref_rssi = Some(ref_rssi);
        self
    }

    pub fn with_ref_dist(mut self, ref_dist: f64) -> Self {
        self.ref_dist = Some(ref_dist);
        self
    }

    pub fn with_bandwidth(mut self, bandwidth_m: f64) -> Self {
        self.bandwidth_m = Some(bandwidth_m);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn with_window(mut self, since: Option<i64>, until: Option<i64>) -> Self {
        self.since = since;
        self.until = until;
        self
    }
}
