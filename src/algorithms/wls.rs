//! Weighted least-squares trilateration ("wls" method)
//!
//! Gauss–Newton on the distance residuals `dist_i − r_i`, starting from the
//! mean of the projected points. Each point is weighted by
//! `1 / (1 + r_i / 1000)` so short inferred distances count more.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::linalg::{ClosedForm2x2, NormalEquationSolver};
use crate::core::{Circle, GEOMETRY_EPSILON_M, MIN_OBSERVATIONS_LEAST_SQUARES};
use crate::validation::error::{Degeneracy, EstimationError, SolveResult};

/// Default Gauss–Newton iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Default step-size convergence threshold (m)
pub const DEFAULT_CONVERGENCE_M: f64 = 0.1;

/// Why the iteration stopped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// Step fell below the convergence threshold
    Converged,
    /// Normal matrix became singular; the last estimate is kept
    Singular { determinant: f64 },
    /// Iteration cap reached
    MaxIterations,
}

/// Converged (or best-so-far) position in the local plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WlsSolution {
    pub position: Vector2<f64>,
    pub iterations: usize,
    pub termination: Termination,
}

/// Iterative Gauss–Newton solver
#[derive(Debug, Clone, Copy)]
pub struct WeightedLeastSquaresSolver<S = ClosedForm2x2> {
    pub max_iterations: usize,
    pub convergence_threshold_m: f64,
    linear: S,
}

impl Default for WeightedLeastSquaresSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS, DEFAULT_CONVERGENCE_M)
    }
}

impl WeightedLeastSquaresSolver {
    pub fn new(max_iterations: usize, convergence_threshold_m: f64) -> Self {
        Self {
            max_iterations,
            convergence_threshold_m,
            linear: ClosedForm2x2::default(),
        }
    }
}

impl<S: NormalEquationSolver> WeightedLeastSquaresSolver<S> {
    /// Swap the 2x2 normal-equation solve
    pub fn with_linear_solver<T: NormalEquationSolver>(self, linear: T) -> WeightedLeastSquaresSolver<T> {
        WeightedLeastSquaresSolver {
            max_iterations: self.max_iterations,
            convergence_threshold_m: self.convergence_threshold_m,
            linear,
        }
    }

    pub fn solve(&self, circles: &[Circle]) -> SolveResult<WlsSolution> {
        if circles.len() < MIN_OBSERVATIONS_LEAST_SQUARES {
            return Err(EstimationError::InsufficientData {
                available: circles.len(),
                required: MIN_OBSERVATIONS_LEAST_SQUARES,
            });
        }
        if self.max_iterations == 0 {
            return Err(Degeneracy::NoIterations.into());
        }

        let mut estimate =
            circles.iter().map(Circle::center).sum::<Vector2<f64>>() / circles.len() as f64;
        let mut termination = Termination::MaxIterations;
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;
            let (normal, rhs) = normal_equations(&estimate, circles);

            let step = match self.linear.solve(&normal, &rhs) {
                Ok(step) => step,
                Err(Degeneracy::SingularMatrix { determinant }) => {
                    termination = Termination::Singular { determinant };
                    break;
                }
                Err(other) => return Err(other.into()),
            };

            estimate -= step;
            if step.norm() < self.convergence_threshold_m {
                termination = Termination::Converged;
                break;
            }
        }

        debug!(iterations, ?termination, "gauss-newton finished");

        Ok(WlsSolution {
            position: estimate,
            iterations,
            termination,
        })
    }
}

/// Point weight: nearer inferred distances are trusted more
pub fn range_weight(radius_m: f64) -> f64 {
    1.0 / (1.0 + radius_m / 1000.0)
}

/// Euclidean distance from `position` to a circle center, floored away from zero
fn center_distance(position: &Vector2<f64>, circle: &Circle) -> f64 {
    (position - circle.center()).norm().max(GEOMETRY_EPSILON_M)
}

/// `HᵀWH` and `HᵀWb` at the current estimate
fn normal_equations(position: &Vector2<f64>, circles: &[Circle]) -> (Matrix2<f64>, Vector2<f64>) {
    let mut normal = Matrix2::zeros();
    let mut rhs = Vector2::zeros();
    for circle in circles {
        let dist = center_distance(position, circle);
        let row = (position - circle.center()) / dist;
        let residual = dist - circle.radius_m;
        let w = range_weight(circle.radius_m);
        normal += row * row.transpose() * w;
        rhs += row * (w * residual);
    }
    (normal, rhs)
}

/// Absolute residual `|dist_i − r_i|` of every circle at `position`
pub fn absolute_residuals(position: &Vector2<f64>, circles: &[Circle]) -> Vec<f64> {
    circles
        .iter()
        .map(|c| ((position - c.center()).norm() - c.radius_m).abs())
        .collect()
}
