//! KKT residual evaluation for dense and structured QPs.
//!
//! Both kernels read the QP data and an iterate view, and write into a
//! preallocated residual workspace.  Neither allocates after creation.

mod dense;
mod ocp;
mod settings;

pub use dense::*;
pub use ocp::*;
pub use settings::*;

use crate::algebra::FloatT;
use std::fmt;

/// Infinity norms of the four residual blocks, plus the duality gap
/// measure `mu`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualNorms<T: FloatT = f64> {
    pub res_g: T,
    pub res_b: T,
    pub res_d: T,
    pub res_m: T,
    pub mu: T,
}

impl<T: FloatT> ResidualNorms<T> {
    /// True when every norm is within its tolerance.  `res_m` and `mu`
    /// are both held to `tol_comp`.
    pub fn converged(&self, tols: &ResidualTolerances<T>) -> bool {
        self.res_g <= tols.tol_stat
            && self.res_b <= tols.tol_eq
            && self.res_d <= tols.tol_ineq
            && self.res_m <= tols.tol_comp
            && self.mu <= tols.tol_comp
    }
}

impl<T: FloatT> fmt::Display for ResidualNorms<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "res_g = {:.3e}, res_b = {:.3e}, res_d = {:.3e}, res_m = {:.3e}, mu = {:.3e}",
            self.res_g, self.res_b, self.res_d, self.res_m, self.mu
        )
    }
}

#[test]
fn test_converged() {
    let norms = ResidualNorms {
        res_g: 1e-9,
        res_b: 0.,
        res_d: 1e-10,
        res_m: 5e-9,
        mu: 2e-9,
    };
    let tols = ResidualTolerances::<f64>::default();
    assert!(norms.converged(&tols));

    let norms = ResidualNorms { mu: 1e-7, ..norms };
    assert!(!norms.converged(&tols));
    assert!(norms.to_string().starts_with("res_g = 1.000e-9"));
}
