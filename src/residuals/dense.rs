#![allow(non_snake_case)]

use super::ResidualNorms;
use crate::algebra::*;
use crate::dense_qp::{DenseQp, DenseQpDim};
use crate::ocp_qp::{check_indices, check_len, QpError};

/// Borrowed view of a dense QP iterate.
///
/// `lam` and `t` are packed like the constraint data `d`, i.e.
/// `[lb; lg; ub; ug]` rows.
#[derive(Debug, Clone, Copy)]
pub struct DenseQpIterate<'a, T: FloatT = f64> {
    /// primal variables
    pub v: &'a [T],
    /// equality multipliers
    pub pi: &'a [T],
    /// inequality multipliers
    pub lam: &'a [T],
    /// inequality slacks
    pub t: &'a [T],
}

// ---------------
// Residuals type for dense QPs
// ---------------

/// KKT residuals of a dense QP, preallocated for one set of dimensions.
#[derive(Debug, Clone)]
pub struct DenseQpResiduals<T: FloatT = f64> {
    pub dim: DenseQpDim,

    // stationarity
    pub res_g: Vec<T>,
    // equality constraints
    pub res_b: Vec<T>,
    // slack consistency, packed like `d`
    pub res_d: Vec<T>,
    // complementarity
    pub res_m: Vec<T>,
    // duality gap measure
    pub mu: T,

    // lam_l - lam_u for bounds and general constraints
    tmp_nb: Vec<T>,
    tmp_ng: Vec<T>,
}

impl<T: FloatT> DenseQpResiduals<T> {
    pub fn new(dim: DenseQpDim) -> Self {
        let DenseQpDim { nv, ne, nb, ng } = dim;
        Self {
            dim,
            res_g: vec![T::zero(); nv],
            res_b: vec![T::zero(); ne],
            res_d: vec![T::zero(); dim.nc()],
            res_m: vec![T::zero(); dim.nc()],
            mu: T::zero(),
            tmp_nb: vec![T::zero(); nb],
            tmp_ng: vec![T::zero(); ng],
        }
    }

    pub fn res_d_lb(&self) -> &[T] {
        &self.res_d[..self.dim.nb]
    }
    pub fn res_d_lg(&self) -> &[T] {
        let DenseQpDim { nb, ng, .. } = self.dim;
        &self.res_d[nb..nb + ng]
    }
    pub fn res_d_ub(&self) -> &[T] {
        let DenseQpDim { nb, ng, .. } = self.dim;
        &self.res_d[nb + ng..2 * nb + ng]
    }
    pub fn res_d_ug(&self) -> &[T] {
        let DenseQpDim { nb, ng, .. } = self.dim;
        &self.res_d[2 * nb + ng..]
    }

    /// Infinity norms of the residual vectors, plus `mu`.
    pub fn norms(&self) -> ResidualNorms<T> {
        ResidualNorms {
            res_g: self.res_g.norm_inf(),
            res_b: self.res_b.norm_inf(),
            res_d: self.res_d.norm_inf(),
            res_m: self.res_m.norm_inf(),
            mu: self.mu,
        }
    }

    fn check_dims(&self, qp: &DenseQp<T>, it: &DenseQpIterate<T>) -> Result<(), QpError> {
        let dim = qp.dim;
        debug_assert_eq!(self.dim, dim);
        check_len(self.dim.nv, dim.nv)?;
        check_len(self.dim.ne, dim.ne)?;
        check_len(self.dim.nb, dim.nb)?;
        check_len(self.dim.ng, dim.ng)?;

        check_len(dim.nv, qp.g.len())?;
        check_len(dim.ne, qp.b.len())?;
        check_len(dim.nb, qp.idxb.len())?;
        check_indices(&qp.idxb, dim.nv)?;
        check_len(dim.nc(), qp.d.len())?;
        check_len(dim.nc(), qp.m.len())?;
        check_len(dim.nv * dim.nv, qp.H.data.len())?;
        check_len(dim.ne * dim.nv, qp.A.data.len())?;
        check_len(dim.nv * dim.ng, qp.Ct.data.len())?;

        debug_assert_eq!(it.v.len(), dim.nv);
        debug_assert_eq!(it.pi.len(), dim.ne);
        debug_assert_eq!(it.lam.len(), dim.nc());
        debug_assert_eq!(it.t.len(), dim.nc());
        check_len(dim.nv, it.v.len())?;
        check_len(dim.ne, it.pi.len())?;
        check_len(dim.nc(), it.lam.len())?;
        check_len(dim.nc(), it.t.len())?;
        Ok(())
    }

    /// Evaluates all residuals at `it`.
    ///
    /// ```text
    /// res_g = H v + g - A'pi + P (lam_lb - lam_ub) + Ct (lam_lg - lam_ug)
    /// res_b = A v - b
    /// res_d = [-v[idxb] + lb + t_lb;  -Ct'v + lg + t_lg;
    ///          -v[idxb] + ub - t_ub;  -Ct'v + ug - t_ug]
    /// res_m = lam .* t - m
    /// mu    = sum(lam .* t) / (2nb + 2ng)
    /// ```
    ///
    /// where `P` scatters into the bounded positions `idxb`.
    pub fn update(&mut self, qp: &DenseQp<T>, it: &DenseQpIterate<T>) -> Result<(), QpError> {
        self.check_dims(qp, it)?;

        let DenseQpDim { nb, ng, .. } = qp.dim;
        let nc = qp.dim.nc();
        let idxb = &qp.idxb[..];

        let (lam_lb, rest) = it.lam.split_at(nb);
        let (lam_lg, rest) = rest.split_at(ng);
        let (lam_ub, lam_ug) = rest.split_at(nb);

        let (t_lb, rest) = it.t.split_at(nb);
        let (t_lg, rest) = rest.split_at(ng);
        let (t_ub, t_ug) = rest.split_at(nb);

        let (d_lb, rest) = qp.d.split_at(nb);
        let (d_lg, rest) = rest.split_at(ng);
        let (d_ub, d_ug) = rest.split_at(nb);

        // res_g = H v + g - A'pi
        self.res_g.copy_from(&qp.g);
        qp.H.sym(MatrixTriangle::Tril).symv(&mut self.res_g, it.v, T::one(), T::one());
        qp.A.t().gemv(&mut self.res_g, it.pi, -T::one(), T::one());

        // bound multipliers, differenced once then scattered
        self.tmp_nb.waxpby(T::one(), lam_lb, -T::one(), lam_ub);
        self.res_g.scatter_add(T::one(), &self.tmp_nb, idxb);

        // general constraint multipliers
        self.tmp_ng.waxpby(T::one(), lam_lg, -T::one(), lam_ug);
        qp.Ct.gemv(&mut self.res_g, &self.tmp_ng, T::one(), T::one());

        // res_b = A v - b
        self.res_b.copy_from(&qp.b);
        qp.A.gemv(&mut self.res_b, it.v, T::one(), -T::one());

        // res_d, stored upper bounds are negated
        let (r_lb, rest) = self.res_d.split_at_mut(nb);
        let (r_lg, rest) = rest.split_at_mut(ng);
        let (r_ub, r_ug) = rest.split_at_mut(nb);

        // both sides start from the negated constraint value
        r_lb.gather(-T::one(), it.v, idxb);
        r_ub.copy_from(r_lb);
        r_lb.axpby(T::one(), d_lb, T::one()).axpby(T::one(), t_lb, T::one());
        r_ub.axpby(-T::one(), d_ub, T::one()).axpby(-T::one(), t_ub, T::one());

        qp.Ct.t().gemv(r_lg, it.v, -T::one(), T::zero());
        r_ug.copy_from(r_lg);
        r_lg.axpby(T::one(), d_lg, T::one()).axpby(T::one(), t_lg, T::one());
        r_ug.axpby(-T::one(), d_ug, T::one()).axpby(-T::one(), t_ug, T::one());

        // res_m = lam .* t - m
        let gap = self.res_m.muldot(it.lam, it.t);
        self.res_m.axpby(-T::one(), &qp.m, T::one());

        self.mu = if nc > 0 {
            gap / nc.as_T()
        } else {
            T::zero()
        };

        Ok(())
    }
}

/// Evaluates the KKT residuals of a dense QP at `it` into `res`.
pub fn compute_dense_residuals<T: FloatT>(
    qp: &DenseQp<T>,
    it: &DenseQpIterate<T>,
    res: &mut DenseQpResiduals<T>,
) -> Result<(), QpError> {
    res.update(qp, it)
}
