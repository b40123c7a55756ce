//! RSSI-weighted centroid ("centroid" method and universal fallback)
//!
//! Works directly on latitude/longitude without projecting, weighting each
//! observation by `(10^(rssi/10))^(2/n)`.

use crate::algorithms::path_loss::PathLossModel;
use crate::core::{GeoPoint, Observation};
use crate::validation::error::{Degeneracy, EstimationError, SolveResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidEstimator {
    model: PathLossModel,
}

impl CentroidEstimator {
    pub fn new(model: PathLossModel) -> Self {
        Self { model }
    }

    pub fn estimate(&self, observations: &[Observation]) -> SolveResult<GeoPoint> {
        if observations.is_empty() {
            return Err(EstimationError::InsufficientData { available: 0, required: 1 });
        }

        let (mut sum_w, mut sum_lat, mut sum_lon) = (0.0, 0.0, 0.0);
        for obs in observations {
            let w = self.model.power_weight(obs.rssi_dbm);
            sum_w += w;
            sum_lat += w * obs.lat;
            sum_lon += w * obs.lon;
        }

        if sum_w <= 0.0 || !sum_w.is_finite() {
            return Err(Degeneracy::ZeroTotalWeight.into());
        }

        Ok(GeoPoint {
            lat: sum_lat / sum_w,
            lon: sum_lon / sum_w,
        })
    }
}
