//! Intersection voting ("accum" method)
//!
//! Every pairwise circle crossing casts a weighted vote. The densest vote
//! (largest sum of weights within `bandwidth_m`) becomes the cluster center,
//! and the estimate is the linearly-decaying weighted mean of the votes
//! around it. One bad circle only adds stray votes, so the mode survives as
//! long as most pairs agree.

use nalgebra::Vector2;
use tracing::debug;

use crate::algorithms::intersection::pairwise_intersections;
use crate::core::{Circle, IntersectionPoint, MIN_BANDWIDTH_M, MIN_OBSERVATIONS_GEOMETRIC};
use crate::validation::error::{Degeneracy, EstimationError, SolveResult};

/// Output of a voting round
#[derive(Debug, Clone, PartialEq)]
pub struct VoteEstimate {
    pub position: Vector2<f64>,
    /// Index of the winning intersection point
    pub center_index: usize,
    /// Neighborhood score of the winner
    pub score: f64,
    /// Intersections that contributed to the final mean
    pub support: usize,
    /// All intersections considered
    pub candidates: usize,
}

/// Density-weighted mode estimate over circle intersections
#[derive(Debug, Clone, Copy)]
pub struct VotingClusterer {
    bandwidth_m: f64,
}

impl VotingClusterer {
    pub fn new(bandwidth_m: f64) -> Self {
        Self {
            bandwidth_m: bandwidth_m.max(MIN_BANDWIDTH_M),
        }
    }

    pub fn bandwidth_m(&self) -> f64 {
        self.bandwidth_m
    }

    pub fn estimate(&self, circles: &[Circle]) -> SolveResult<VoteEstimate> {
        if circles.len() < MIN_OBSERVATIONS_GEOMETRIC {
            return Err(EstimationError::InsufficientData {
                available: circles.len(),
                required: MIN_OBSERVATIONS_GEOMETRIC,
            });
        }

        let points = pairwise_intersections(circles);
        if points.is_empty() {
            return Err(Degeneracy::NoIntersections.into());
        }

        let (center_index, score) = self.densest(&points);
        let center = points[center_index];

        let mut weighted = Vector2::zeros();
        let mut total_weight = 0.0;
        let mut support = 0;
        for point in &points {
            let distance = point.distance_to(&center);
            if distance > self.bandwidth_m {
                continue;
            }
            let w = point.weight * (1.0 - distance / self.bandwidth_m);
            weighted += point.position() * w;
            total_weight += w;
            support += 1;
        }

        // Only zero-weight (tangent) votes nearby: the center itself is the best estimate
        let position = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            center.position()
        };

        debug!(
            candidates = points.len(),
            support,
            score,
            "intersection vote settled"
        );

        Ok(VoteEstimate {
            position,
            center_index,
            score,
            support,
            candidates: points.len(),
        })
    }

    /// Point with the largest neighborhood score; ties keep the earliest point
    fn densest(&self, points: &[IntersectionPoint]) -> (usize, f64) {
        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, candidate) in points.iter().enumerate() {
            let score: f64 = points
                .iter()
                .filter(|other| candidate.distance_to(other) <= self.bandwidth_m)
                .map(|other| other.weight)
                .sum();
            if score > best_score {
                best_score = score;
                best_index = i;
            }
        }
        (best_index, best_score)
    }
}
