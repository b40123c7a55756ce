//! Local tangent-plane projection
//!
//! Equirectangular approximation around an origin placed at the mean of the
//! observations being solved, so precision is best where the data is:
//! - `x = R·cos(lat0)·(lon − lon0)` (east, meters)
//! - `y = R·(lat − lat0)` (north, meters)
//!
//! Accuracy degrades past roughly 50 km from the origin and near the poles,
//! which is well outside a single cell's coverage.

use serde::{Deserialize, Serialize};

use crate::algorithms::path_loss::PathLossModel;
use crate::core::{Circle, GeoPoint, Observation, EARTH_RADIUS_M};

/// Projection origin for one estimation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPlane {
    pub lat0: f64,
    pub lon0: f64,
}

impl LocalPlane {
    pub fn new(lat0: f64, lon0: f64) -> Self {
        Self { lat0, lon0 }
    }

    /// Plane centered on the coordinate mean of `observations`
    pub fn centered_on(observations: &[Observation]) -> Option<Self> {
        if observations.is_empty() {
            return None;
        }
        let n = observations.len() as f64;
        let lat0 = observations.iter().map(|o| o.lat).sum::<f64>() / n;
        let lon0 = observations.iter().map(|o| o.lon).sum::<f64>() / n;
        Some(Self { lat0, lon0 })
    }

    /// Geographic degrees to plane meters
    pub fn to_xy(&self, lat: f64, lon: f64) -> (f64, f64) {
        to_xy(lat, lon, self.lat0, self.lon0)
    }

    /// Plane meters back to geographic degrees
    pub fn to_lat_lon(&self, x: f64, y: f64) -> GeoPoint {
        let (lat, lon) = to_lat_lon(x, y, self.lat0, self.lon0);
        GeoPoint { lat, lon }
    }

    /// Project every observation and attach its inferred radius
    pub fn circles(&self, observations: &[Observation], model: &PathLossModel) -> Vec<Circle> {
        observations
            .iter()
            .map(|o| {
                let (x, y) = self.to_xy(o.lat, o.lon);
                Circle::new(x, y, model.distance(o.rssi_dbm))
            })
            .collect()
    }
}

pub fn to_xy(lat: f64, lon: f64, lat0: f64, lon0: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * lat0.to_radians().cos() * (lon - lon0).to_radians();
    let y = EARTH_RADIUS_M * (lat - lat0).to_radians();
    (x, y)
}

pub fn to_lat_lon(x: f64, y: f64, lat0: f64, lon0: f64) -> (f64, f64) {
    let lat = lat0 + (y / EARTH_RADIUS_M).to_degrees();
    let lon = lon0 + (x / (EARTH_RADIUS_M * lat0.to_radians().cos())).to_degrees();
    (lat, lon)
}
