//! Per-transmitter estimation with centroid fallback
//!
//! Geometric methods run in a local plane centered on the observation mean.
//! Any solver error is logged and replaced by the power-weighted centroid,
//! so coordinates are only null when a transmitter has no observations.

use nalgebra::Vector2;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::algorithms::accumulator::VotingClusterer;
use crate::algorithms::centroid::CentroidEstimator;
use crate::algorithms::path_loss::PathLossModel;
use crate::algorithms::projection::LocalPlane;
use crate::algorithms::robust::RobustEstimator;
use crate::algorithms::wls::WeightedLeastSquaresSolver;
use crate::api::types::{DebugCircle, DebugPayload, EstimationResult, Outcome};
use crate::core::{GeoPoint, ObservationSet, MIN_OBSERVATIONS_GEOMETRIC};
use crate::processing::grouping::{group_records, GroupingReport};
use crate::processing::parser::LogRecord;
use crate::utils::config::{EstimationParams, Method};
use crate::validation::error::{ConfigError, EstimationError, SolveResult};

/// Resolved strategies for one parameter set
#[derive(Debug, Clone)]
pub struct EstimationOrchestrator {
    params: EstimationParams,
    model: PathLossModel,
    wls: WeightedLeastSquaresSolver,
    robust: RobustEstimator,
    clusterer: VotingClusterer,
    centroid: CentroidEstimator,
}

impl EstimationOrchestrator {
    pub fn new(params: EstimationParams) -> Self {
        let model = params.path_loss_model();
        let wls = WeightedLeastSquaresSolver::new(params.max_iter, params.convergence_threshold_m);
        Self {
            model,
            wls,
            robust: RobustEstimator::new(wls, params.robust_k),
            clusterer: VotingClusterer::new(params.bandwidth_m),
            centroid: CentroidEstimator::new(model),
            params,
        }
    }

    pub fn params(&self) -> &EstimationParams {
        &self.params
    }

    /// Estimate one transmitter's position
    pub fn estimate(&self, set: &ObservationSet) -> EstimationResult {
        let requested = self.params.method;
        let observations = &set.observations;

        let fallback_reason = match self.solve_geometric(requested, set) {
            Some(Ok(point)) => {
                return self.result(set, Some(point), requested, Outcome::Converged, None);
            }
            Some(Err(error)) => {
                debug!(
                    cell_id = %set.transmitter_id,
                    method = %requested,
                    %error,
                    "falling back to centroid"
                );
                Some(error.to_string())
            }
            None => None,
        };

        match self.centroid.estimate(observations) {
            Ok(point) => {
                let outcome = if fallback_reason.is_some() { Outcome::FellBack } else { Outcome::Converged };
                self.result(set, Some(point), Method::Centroid, outcome, fallback_reason)
            }
            Err(error) => {
                debug!(cell_id = %set.transmitter_id, %error, "no estimate");
                self.result(set, None, Method::Centroid, Outcome::NoData, Some(error.to_string()))
            }
        }
    }

    /// Estimate every set in parallel; output order follows input order
    pub fn estimate_all(&self, sets: &[ObservationSet]) -> Vec<EstimationResult> {
        let results: Vec<EstimationResult> = sets.par_iter().map(|set| self.estimate(set)).collect();

        let located = results.iter().filter(|r| r.has_position()).count();
        info!(
            transmitters = results.len(),
            located,
            method = %self.params.method,
            "estimation batch finished"
        );
        results
    }

    /// `None` when the method does not work in the plane
    fn solve_geometric(&self, method: Method, set: &ObservationSet) -> Option<SolveResult<GeoPoint>> {
        if method == Method::Centroid {
            return None;
        }
        let observations = &set.observations;
        let plane = match LocalPlane::centered_on(observations) {
            Some(plane) if observations.len() >= MIN_OBSERVATIONS_GEOMETRIC => plane,
            _ => {
                return Some(Err(EstimationError::InsufficientData {
                    available: observations.len(),
                    required: MIN_OBSERVATIONS_GEOMETRIC,
                }))
            }
        };
        let circles = plane.circles(observations, &self.model);

        let solved: SolveResult<Vector2<f64>> = match method {
            Method::Wls => self.wls.solve(&circles).map(|s| s.position),
            Method::Robust => self.robust.solve(&circles).map(|r| r.solution.position),
            Method::Accum => self.clusterer.estimate(&circles).map(|v| v.position),
            Method::Centroid => return None,
        };
        Some(solved.map(|p| plane.to_lat_lon(p.x, p.y)))
    }

    fn result(
        &self,
        set: &ObservationSet,
        point: Option<GeoPoint>,
        used: Method,
        outcome: Outcome,
        reason: Option<String>,
    ) -> EstimationResult {
        let debug = self.params.debug.then(|| DebugPayload {
            circles: set
                .observations
                .iter()
                .map(|o| DebugCircle {
                    lat: o.lat,
                    lon: o.lon,
                    radius_m: self.model.distance(o.rssi_dbm),
                })
                .collect(),
            method: used,
            requested: self.params.method,
            outcome,
            reason,
        });

        EstimationResult {
            transmitter_id: set.transmitter_id.clone(),
            kind: set.kind.clone(),
            lat: point.map(|p| p.lat),
            lon: point.map(|p| p.lon),
            count: set.len(),
            debug,
        }
    }
}

/// Grouping plus estimation for one batch of rows
#[derive(Debug, Clone)]
pub struct BatchEstimate {
    pub results: Vec<EstimationResult>,
    pub grouping: GroupingReport,
}

/// Group raw rows by transmitter and estimate each group
pub fn estimate_from_records(params: EstimationParams, records: &[LogRecord]) -> Result<BatchEstimate, ConfigError> {
    params.validate()?;
    let grouping = group_records(records, params.window.as_ref());
    let results = EstimationOrchestrator::new(params).estimate_all(&grouping.sets);
    Ok(BatchEstimate { results, grouping })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Observation;
    use crate::processing::parser::parse_records;
    use approx::assert_abs_diff_eq;

    fn triangle(rssi: [f64; 3]) -> ObservationSet {
        ObservationSet::new(
            "44011",
            "LTE",
            vec![
                Observation::new(35.000, 135.000, rssi[0]),
                Observation::new(35.001, 135.000, rssi[1]),
                Observation::new(35.000, 135.001, rssi[2]),
            ],
        )
    }

    fn with_method(method: Method) -> EstimationParams {
        EstimationParams {
            method,
            debug: true,
            ..EstimationParams::default()
        }
    }

    fn strictly_inside_triangle(result: &EstimationResult) -> bool {
        let (Some(lat), Some(lon)) = (result.lat, result.lon) else {
            return false;
        };
        let u = (lat - 35.0) / 0.001;
        let v = (lon - 135.0) / 0.001;
        u > 0.0 && v > 0.0 && u + v < 1.0
    }

    #[test]
    fn test_wls_estimate_lies_inside_observation_triangle() {
        let orchestrator = EstimationOrchestrator::new(EstimationParams::default());
        let result = orchestrator.estimate(&triangle([-60.0, -70.0, -70.0]));
        assert!(strictly_inside_triangle(&result), "{:?}", result);
        assert_eq!(result.count, 3);
        assert!(result.debug.is_none());
    }

    #[test]
    fn test_debug_payload_reports_circles_and_method() {
        let orchestrator = EstimationOrchestrator::new(with_method(Method::Wls));
        let result = orchestrator.estimate(&triangle([-60.0, -70.0, -70.0]));
        let debug = result.debug.unwrap();
        assert_eq!(debug.method, Method::Wls);
        assert_eq!(debug.outcome, Outcome::Converged);
        assert_eq!(debug.circles.len(), 3);
        assert_abs_diff_eq!(debug.circles[0].radius_m, 10.0, epsilon = 1e-9);
        assert_eq!(debug.circles[1].lat, 35.001);
        assert!(debug.reason.is_none());
    }

    #[test]
    fn test_robust_matches_wls_without_outliers() {
        let set = triangle([-60.0, -70.0, -70.0]);
        let wls = EstimationOrchestrator::new(with_method(Method::Wls)).estimate(&set);
        let robust = EstimationOrchestrator::new(with_method(Method::Robust)).estimate(&set);
        assert_abs_diff_eq!(robust.lat.unwrap(), wls.lat.unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(robust.lon.unwrap(), wls.lon.unwrap(), epsilon = 1e-12);
        assert_eq!(robust.debug.unwrap().method, Method::Robust);
    }

    #[test]
    fn test_accum_uses_intersections_when_circles_cross() {
        let orchestrator = EstimationOrchestrator::new(with_method(Method::Accum));
        let result = orchestrator.estimate(&triangle([-80.0, -80.0, -80.0]));
        let debug = result.debug.clone().unwrap();
        assert_eq!(debug.method, Method::Accum);
        assert_eq!(debug.outcome, Outcome::Converged);
        assert!(result.lat.unwrap().is_finite());
        assert!(result.lon.unwrap().is_finite());
    }

    #[test]
    fn test_accum_without_intersections_falls_back_to_centroid() {
        let set = triangle([-60.0, -70.0, -70.0]);
        let result = EstimationOrchestrator::new(with_method(Method::Accum)).estimate(&set);
        let centroid = CentroidEstimator::default().estimate(&set.observations).unwrap();

        let debug = result.debug.unwrap();
        assert_eq!(debug.method, Method::Centroid);
        assert_eq!(debug.requested, Method::Accum);
        assert_eq!(debug.outcome, Outcome::FellBack);
        assert_eq!(debug.reason.as_deref(), Some("numeric degeneracy: no circle pair intersects"));
        assert_eq!(result.lat, Some(centroid.lat));
        assert_eq!(result.lon, Some(centroid.lon));
    }

    #[test]
    fn test_single_observation_falls_back_to_its_position() {
        let set = ObservationSet::new("7", "GSM", vec![Observation::new(35.25, 139.5, -90.0)]);
        let result = EstimationOrchestrator::new(with_method(Method::Wls)).estimate(&set);
        assert_abs_diff_eq!(result.lat.unwrap(), 35.25, epsilon = 1e-12);
        assert_abs_diff_eq!(result.lon.unwrap(), 139.5, epsilon = 1e-12);
        assert_eq!(result.count, 1);
        assert_eq!(result.debug.unwrap().outcome, Outcome::FellBack);
    }

    #[test]
    fn test_two_observations_are_too_few_for_wls() {
        let set = ObservationSet::new(
            "7",
            "GSM",
            vec![Observation::new(35.0, 139.0, -70.0), Observation::new(35.001, 139.0, -70.0)],
        );
        let result = EstimationOrchestrator::new(with_method(Method::Wls)).estimate(&set);
        let debug = result.debug.unwrap();
        assert_eq!(debug.outcome, Outcome::FellBack);
        assert_eq!(debug.reason.as_deref(), Some("insufficient data: 2 points available, 3 required"));
        assert_abs_diff_eq!(result.lat.unwrap(), 35.0005, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_iteration_budget_falls_back() {
        let params = EstimationParams {
            max_iter: 0,
            ..with_method(Method::Robust)
        };
        let result = EstimationOrchestrator::new(params).estimate(&triangle([-60.0, -70.0, -70.0]));
        assert!(result.has_position());
        let debug = result.debug.as_ref().unwrap();
        assert_eq!(debug.outcome, Outcome::FellBack);
        assert!(debug.reason.as_deref().unwrap().contains("no solver iteration"));
    }

    #[test]
    fn test_explicit_centroid_is_not_a_fallback() {
        let result = EstimationOrchestrator::new(with_method(Method::Centroid)).estimate(&triangle([-60.0, -60.0, -60.0]));
        let debug = result.debug.unwrap();
        assert_eq!(debug.method, Method::Centroid);
        assert_eq!(debug.outcome, Outcome::Converged);
        assert_abs_diff_eq!(result.lat.unwrap(), 35.0 + 0.001 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_set_has_null_coordinates() {
        let set = ObservationSet::new("9", "NR", Vec::new());
        for method in Method::ALL {
            let result = EstimationOrchestrator::new(with_method(method)).estimate(&set);
            assert_eq!(result.lat, None);
            assert_eq!(result.lon, None);
            assert_eq!(result.count, 0);
            assert_eq!(result.debug.unwrap().outcome, Outcome::NoData);
        }
    }

    #[test]
    fn test_estimation_is_reproducible() {
        let orchestrator = EstimationOrchestrator::new(with_method(Method::Accum));
        let set = triangle([-80.0, -82.0, -79.0]);
        assert_eq!(orchestrator.estimate(&set), orchestrator.estimate(&set));
    }

    #[test]
    fn test_estimate_all_preserves_input_order() {
        let sets: Vec<ObservationSet> = (0..32)
            .map(|i| {
                ObservationSet::new(
                    format!("cell-{}", i),
                    "LTE",
                    vec![Observation::new(35.0 + i as f64 * 0.01, 135.0, -70.0)],
                )
            })
            .collect();
        let results = EstimationOrchestrator::new(EstimationParams::default()).estimate_all(&sets);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.transmitter_id, format!("cell-{}", i));
            assert_abs_diff_eq!(result.lat.unwrap(), 35.0 + i as f64 * 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_estimate_from_raw_records() {
        let json = r#"[
            {"timestamp": 100, "lat": 35.000, "lon": 135.000, "cells": [
                {"type": "LTE", "rssi": -60, "cell_id": 44011},
                {"type": "GSM", "rssi": "n/a", "cell_id": 12}
            ]},
            {"timestamp": 101, "lat": 35.001, "lon": 135.000, "cells": [{"type": "LTE", "rssi": -70, "cell_id": 44011}]},
            {"timestamp": 102, "lat": 35.000, "lon": 135.001, "cells": [{"type": "LTE", "rssi": -70, "cell_id": "44011"}]}
        ]"#;
        let records = parse_records(json).unwrap();
        let batch = estimate_from_records(EstimationParams::default(), &records).unwrap();

        assert_eq!(batch.grouping.skipped.len(), 1);
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].transmitter_id, "44011");
        assert_eq!(batch.results[0].count, 3);
        assert!(strictly_inside_triangle(&batch.results[0]));
    }

    #[test]
    fn test_invalid_params_are_rejected_before_estimation() {
        let params = EstimationParams {
            ref_dist: -1.0,
            ..EstimationParams::default()
        };
        assert!(matches!(
            estimate_from_records(params, &[]),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }
}
