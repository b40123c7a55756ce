//! Small linear solves for the normal equations
//!
//! The solvers only ever estimate two unknowns, so the closed-form 2x2
//! inverse is exact. It sits behind [`NormalEquationSolver`] so a general
//! decomposition can replace it if the unknowns ever grow.

use nalgebra::{Matrix2, Vector2};

use crate::core::SINGULAR_DETERMINANT;
use crate::validation::error::Degeneracy;

/// Solves `A·x = b` for a symmetric normal-equation matrix
pub trait NormalEquationSolver {
    fn solve(&self, a: &Matrix2<f64>, b: &Vector2<f64>) -> Result<Vector2<f64>, Degeneracy>;
}

/// Cramer's rule with a determinant guard
#[derive(Debug, Clone, Copy)]
pub struct ClosedForm2x2 {
    pub min_determinant: f64,
}

impl Default for ClosedForm2x2 {
    fn default() -> Self {
        Self {
            min_determinant: SINGULAR_DETERMINANT,
        }
    }
}

impl NormalEquationSolver for ClosedForm2x2 {
    fn solve(&self, a: &Matrix2<f64>, b: &Vector2<f64>) -> Result<Vector2<f64>, Degeneracy> {
        let det = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)];
        if !det.is_finite() || det.abs() < self.min_determinant {
            return Err(Degeneracy::SingularMatrix { determinant: det });
        }
        let inverse = Matrix2::new(a[(1, 1)], -a[(0, 1)], -a[(1, 0)], a[(0, 0)]) / det;
        Ok(inverse * b)
    }
}

/// LU decomposition with the same determinant guard; the drop-in for
/// systems that outgrow the closed form
#[derive(Debug, Clone, Copy)]
pub struct LuSolver {
    pub min_determinant: f64,
}

impl Default for LuSolver {
    fn default() -> Self {
        Self {
            min_determinant: SINGULAR_DETERMINANT,
        }
    }
}

impl NormalEquationSolver for LuSolver {
    fn solve(&self, a: &Matrix2<f64>, b: &Vector2<f64>) -> Result<Vector2<f64>, Degeneracy> {
        let det = a.determinant();
        if !det.is_finite() || det.abs() < self.min_determinant {
            return Err(Degeneracy::SingularMatrix { determinant: det });
        }
        a.lu().solve(b).ok_or(Degeneracy::SingularMatrix { determinant: det })
    }
}

/// Convenience wrapper using the default guard
pub fn solve_2x2(a: &Matrix2<f64>, b: &Vector2<f64>) -> Result<Vector2<f64>, Degeneracy> {
    ClosedForm2x2::default().solve(a, b)
}
