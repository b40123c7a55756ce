//! Outlier-rejecting trilateration ("robust" method)
//!
//! Runs WLS once, scores every circle by its absolute residual, drops those
//! far from the median in MAD units and solves again on the survivors.

use tracing::debug;

use crate::algorithms::linalg::{ClosedForm2x2, NormalEquationSolver};
use crate::algorithms::wls::{absolute_residuals, WeightedLeastSquaresSolver, WlsSolution};
use crate::core::{Circle, GEOMETRY_EPSILON_M, MAD_TO_SIGMA, MIN_OBSERVATIONS_LEAST_SQUARES};
use crate::validation::error::SolveResult;

/// Default inlier cutoff in robust standard deviations
pub const DEFAULT_ROBUST_K: f64 = 3.0;

/// Result of a robust solve
#[derive(Debug, Clone, PartialEq)]
pub struct RobustSolution {
    pub solution: WlsSolution,
    /// Indices of the circles the final solve used
    pub inliers: Vec<usize>,
    pub median_residual_m: f64,
    pub mad_m: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RobustEstimator<S = ClosedForm2x2> {
    wls: WeightedLeastSquaresSolver<S>,
    k: f64,
}

impl Default for RobustEstimator {
    fn default() -> Self {
        Self::new(WeightedLeastSquaresSolver::default(), DEFAULT_ROBUST_K)
    }
}

impl<S: NormalEquationSolver> RobustEstimator<S> {
    pub fn new(wls: WeightedLeastSquaresSolver<S>, k: f64) -> Self {
        Self { wls, k }
    }

    pub fn solve(&self, circles: &[Circle]) -> SolveResult<RobustSolution> {
        let initial = self.wls.solve(circles)?;
        let residuals = absolute_residuals(&initial.position, circles);

        let median_residual_m = median(&residuals);
        let deviations: Vec<f64> = residuals.iter().map(|r| (r - median_residual_m).abs()).collect();
        let mad_m = median(&deviations);
        let all: Vec<usize> = (0..circles.len()).collect();

        if mad_m < GEOMETRY_EPSILON_M {
            debug!(median_residual_m, "residual spread is zero, keeping initial estimate");
            return Ok(RobustSolution {
                solution: initial,
                inliers: all,
                median_residual_m,
                mad_m,
            });
        }

        let cutoff = self.k * MAD_TO_SIGMA * mad_m;
        let inliers: Vec<usize> = residuals
            .iter()
            .enumerate()
            .filter(|(_, r)| **r - median_residual_m < cutoff)
            .map(|(i, _)| i)
            .collect();

        debug!(
            kept = inliers.len(),
            total = circles.len(),
            median_residual_m,
            mad_m,
            "robust inlier selection"
        );

        if inliers.len() < MIN_OBSERVATIONS_LEAST_SQUARES {
            return Ok(RobustSolution {
                solution: initial,
                inliers: all,
                median_residual_m,
                mad_m,
            });
        }

        let subset: Vec<Circle> = inliers.iter().map(|&i| circles[i]).collect();
        let solution = self.wls.solve(&subset)?;
        Ok(RobustSolution {
            solution,
            inliers,
            median_residual_m,
            mad_m,
        })
    }
}

/// Median of a slice; mean of the middle pair for even lengths, 0 when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::linalg::LuSolver;
    use crate::validation::error::EstimationError;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector2;

    fn exact(x: f64, y: f64, target: (f64, f64)) -> Circle {
        Circle::new(x, y, ((target.0 - x).powi(2) + (target.1 - y).powi(2)).sqrt())
    }

    #[test]
    fn test_median_odd_even_and_empty() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    fn outlier_layout() -> Vec<Circle> {
        vec![
            exact(-50.0, -50.0, (0.0, 0.0)),
            exact(50.0, -50.0, (0.0, 0.0)),
            exact(0.0, 60.0, (0.0, 0.0)),
            // True range 300 m, inferred 500 m
            Circle::new(0.0, -300.0, 500.0),
        ]
    }

    #[test]
    fn test_gross_outlier_is_rejected() {
        let circles = outlier_layout();

        let initial = WeightedLeastSquaresSolver::default().solve(&circles).unwrap();
        let residuals = absolute_residuals(&initial.position, &circles);

        let robust = RobustEstimator::default().solve(&circles).unwrap();
        assert!(residuals[3] > 10.0 * robust.mad_m, "{:?} vs mad {}", residuals, robust.mad_m);
        assert_eq!(robust.inliers, vec![0, 1, 2]);

        let inliers_only = WeightedLeastSquaresSolver::default().solve(&circles[..3]).unwrap();
        assert!((robust.solution.position - inliers_only.position).norm() < 1.0);
        assert!((initial.position - inliers_only.position).norm() > 1.0);
    }

    #[test]
    fn test_swapped_linear_solver_reaches_robust_path() {
        let circles = outlier_layout();
        let wls = WeightedLeastSquaresSolver::default().with_linear_solver(LuSolver::default());
        let lu = RobustEstimator::new(wls, DEFAULT_ROBUST_K).solve(&circles).unwrap();
        let closed = RobustEstimator::default().solve(&circles).unwrap();
        assert_eq!(lu.inliers, closed.inliers);
        assert_abs_diff_eq!(lu.solution.position.x, closed.solution.position.x, epsilon = 1e-9);
        assert_abs_diff_eq!(lu.solution.position.y, closed.solution.position.y, epsilon = 1e-9);
    }

    #[test]
    fn test_consistent_circles_keep_initial_estimate() {
        let circles = vec![
            exact(0.0, 0.0, (30.0, 40.0)),
            exact(100.0, 0.0, (30.0, 40.0)),
            exact(0.0, 100.0, (30.0, 40.0)),
        ];
        let robust = RobustEstimator::default().solve(&circles).unwrap();
        let plain = WeightedLeastSquaresSolver::default().solve(&circles).unwrap();
        assert_eq!(robust.inliers.len(), 3);
        assert_abs_diff_eq!(robust.solution.position.x, plain.position.x, epsilon = 1e-9);
        assert_abs_diff_eq!(robust.solution.position.y, plain.position.y, epsilon = 1e-9);
        assert!((robust.solution.position - Vector2::new(30.0, 40.0)).norm() < 0.5);
    }

    #[test]
    fn test_wls_failure_propagates() {
        let circles = vec![Circle::new(0.0, 0.0, 10.0), Circle::new(5.0, 0.0, 10.0)];
        let error = RobustEstimator::default().solve(&circles).unwrap_err();
        assert!(matches!(error, EstimationError::InsufficientData { .. }));
    }
}
