use nalgebra::{DMatrix, DVector};
use pave_core::Real;
use serde::{Deserialize, Serialize};

/// Non-linear least squares problem with dense parameter and residual vectors.
pub trait NllsProblem {
    /// Number of parameters in the optimisation vector.
    fn num_params(&self) -> usize;
    /// Number of residual rows.
    fn num_residuals(&self) -> usize;

    fn residuals(&self, x: &DVector<Real>) -> DVector<Real>;

    /// Jacobian of [`NllsProblem::residuals`]; central differences unless
    /// the problem overrides it.
    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let mut j = DMatrix::zeros(self.num_residuals(), x.len());
        let mut probe = x.clone();
        for k in 0..x.len() {
            let h = 1e-6 * x[k].abs().max(1.0);
            probe[k] = x[k] + h;
            let r_plus = self.residuals(&probe);
            probe[k] = x[k] - h;
            let r_minus = self.residuals(&probe);
            probe[k] = x[k];
            j.set_column(k, &((r_plus - r_minus) / (2.0 * h)));
        }
        j
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Iteration budget; the LM backend follows the MINPACK convention of
    /// `max_iters * (n + 1)` function evaluations.
    pub max_iters: usize,
    /// Relative tolerance on the cost reduction.
    pub ftol: Real,
    /// Orthogonality/gradient tolerance.
    pub gtol: Real,
    /// Relative tolerance on parameter updates.
    pub xtol: Real,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-10,
            gtol: 1e-10,
            xtol: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub evaluations: usize,
    /// `0.5 * ||r||²` at the solution.
    pub final_cost: Real,
    pub converged: bool,
}

pub trait NllsSolverBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic;

    impl NllsProblem for Quadratic {
        fn num_params(&self) -> usize {
            2
        }
        fn num_residuals(&self) -> usize {
            2
        }
        fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
            DVector::from_vec(vec![x[0] * x[0], 3.0 * x[0] * x[1]])
        }
    }

    #[test]
    fn numeric_jacobian_matches_analytic() {
        let x = DVector::from_vec(vec![2.0, -1.5]);
        let j = Quadratic.jacobian(&x);
        let expected = DMatrix::from_row_slice(2, 2, &[4.0, 0.0, -4.5, 6.0]);
        assert!((j - expected).abs().max() < 1e-6);
    }
}
