//! Log-distance path-loss model
//!
//! Converts an RSSI reading into the slant distance it implies:
//! `d = ref_dist · 10^((ref_rssi − rssi) / (10·n))`, clipped to
//! [`MIN_DISTANCE_M`, `MAX_DISTANCE_M`].

use serde::{Deserialize, Serialize};

use crate::core::{
    MAX_DISTANCE_M, MIN_DISTANCE_M, MIN_PATH_LOSS_EXPONENT, RSSI_CEILING_DBM, RSSI_FLOOR_DBM,
};

/// Clamp an RSSI reading to the accepted dBm range
pub fn clamp_rssi(rssi_dbm: f64) -> f64 {
    rssi_dbm.clamp(RSSI_FLOOR_DBM, RSSI_CEILING_DBM)
}

/// Clamp the path-loss exponent to its lower bound
pub fn clamp_exponent(n: f64) -> f64 {
    n.max(MIN_PATH_LOSS_EXPONENT)
}

/// Calibrated path-loss model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLossModel {
    /// Path-loss exponent, already clamped
    pub exponent: f64,
    /// RSSI measured at the reference distance (dBm)
    pub ref_rssi_dbm: f64,
    /// Reference distance (m)
    pub ref_dist_m: f64,
}

impl Default for PathLossModel {
    fn default() -> Self {
        Self::new(2.0, -40.0, 1.0)
    }
}

impl PathLossModel {
    pub fn new(exponent: f64, ref_rssi_dbm: f64, ref_dist_m: f64) -> Self {
        Self {
            exponent: clamp_exponent(exponent),
            ref_rssi_dbm,
            ref_dist_m,
        }
    }

    /// Inferred distance in meters for a reading
    pub fn distance(&self, rssi_dbm: f64) -> f64 {
        distance(rssi_dbm, self.exponent, self.ref_rssi_dbm, self.ref_dist_m)
    }

    /// Centroid weight `(10^(rssi/10))^(2/n)`: linear power raised to an
    /// exponent tied to the path-loss exponent
    pub fn power_weight(&self, rssi_dbm: f64) -> f64 {
        let linear_mw = 10f64.powf(clamp_rssi(rssi_dbm) / 10.0);
        linear_mw.powf(2.0 / self.exponent)
    }
}

/// Free-function form of the model; inputs are clamped here as well
pub fn distance(rssi_dbm: f64, n: f64, ref_rssi_dbm: f64, ref_dist_m: f64) -> f64 {
    let rssi = clamp_rssi(rssi_dbm);
    let n = clamp_exponent(n);
    let d = ref_dist_m * 10f64.powf((ref_rssi_dbm - rssi) / (10.0 * n));
    if d.is_nan() {
        return MAX_DISTANCE_M;
    }
    d.clamp(MIN_DISTANCE_M, MAX_DISTANCE_M)
}
