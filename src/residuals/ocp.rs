#![allow(non_snake_case)]

use super::ResidualNorms;
use crate::algebra::*;
use crate::ocp_qp::{check_indices, check_len, OcpQp, OcpQpDim, QpError};
use itertools::izip;

/// Borrowed view of a structured QP iterate.
///
/// Every vector is the stage-wise concatenation of its blocks:
/// `ux` holds `[u; x; sl; su]` per stage, `pi` one block of `nx[i+1]`
/// per transition, and `lam`, `t` are packed like `d` per stage.
#[derive(Debug, Clone, Copy)]
pub struct OcpQpIterate<'a, T: FloatT = f64> {
    pub ux: &'a [T],
    pub pi: &'a [T],
    pub lam: &'a [T],
    pub t: &'a [T],
}

/// KKT residuals of a structured QP, with the same stage-wise stacking
/// as [`OcpQpIterate`].
#[derive(Debug, Clone)]
pub struct OcpQpResiduals<T: FloatT = f64> {
    pub dim: OcpQpDim,
    pub res_g: Vec<T>,
    pub res_b: Vec<T>,
    pub res_d: Vec<T>,
    pub res_m: Vec<T>,
    pub mu: T,

    // per-stage workspace, sized for the largest stage
    tmp_nb: Vec<T>,
    tmp_ng: Vec<T>,
}

impl<T: FloatT> OcpQpResiduals<T> {
    pub fn new(dim: &OcpQpDim) -> Self {
        let max_nb = dim.nb.iter().copied().max().unwrap_or(0);
        let max_ng = dim.ng.iter().copied().max().unwrap_or(0);
        Self {
            dim: dim.clone(),
            res_g: vec![T::zero(); dim.nvt()],
            res_b: vec![T::zero(); dim.net()],
            res_d: vec![T::zero(); dim.nct()],
            res_m: vec![T::zero(); dim.nct()],
            mu: T::zero(),
            tmp_nb: vec![T::zero(); max_nb],
            tmp_ng: vec![T::zero(); max_ng],
        }
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

    // The workspace only depends on the stage-wise bound and constraint
    // counts, so a QP whose nbu/nbx split was resized without changing nb
    // is still accepted.
    fn check_workspace(&self, dim: &OcpQpDim) -> Result<(), QpError> {
        check_len(self.dim.N, dim.N)?;
        check_len(self.dim.nvt(), dim.nvt())?;
        check_len(self.dim.net(), dim.net())?;
        check_len(self.dim.nct(), dim.nct())?;
        for i in 0..=dim.N {
            check_len(self.dim.nb[i], dim.nb[i])?;
            check_len(self.dim.ng[i], dim.ng[i])?;
        }
        Ok(())
    }

    fn check_dims(&self, qp: &OcpQp<T>, it: &OcpQpIterate<T>) -> Result<(), QpError> {
        let dim = qp.dim();
        debug_assert!(self.check_workspace(dim).is_ok());
        debug_assert_eq!(it.ux.len(), dim.nvt());
        debug_assert_eq!(it.pi.len(), dim.net());
        debug_assert_eq!(it.lam.len(), dim.nct());
        debug_assert_eq!(it.t.len(), dim.nct());

        self.check_workspace(dim)?;
        check_len(dim.nvt(), it.ux.len())?;
        check_len(dim.net(), it.pi.len())?;
        check_len(dim.nct(), it.lam.len())?;
        check_len(dim.nct(), it.t.len())?;

        // index arrays are raw memory after bind or resize
        for i in 0..=dim.N {
            check_indices(qp.idxb(i), dim.nux(i))?;
            check_indices(qp.idxs(i), dim.nb[i] + dim.ng[i])?;
        }
        Ok(())
    }

    /// Evaluates all residuals at `it`.
    ///
    /// Per stage `i`, with `ux = [u; x]` and constraint values
    /// `c = [ux[idxb]; DCt'ux]`, a slack `j` softening row `k = idxs[j]`
    /// shifts the lower value of row `k` by `+sl[j]` and the upper value
    /// by `-su[j]`.  Then
    ///
    /// ```text
    /// res_g(ux) = RSQ ux + rq + [B'; A'] pi_i - [0; pi_{i-1}]
    ///             + P (lam_lb - lam_ub) + DCt (lam_lg - lam_ug)
    /// res_g(sl) = Zl sl + zl + lam_l[idxs] + lam_ls
    /// res_g(su) = Zu su + zu + lam_u[idxs] + lam_us
    /// res_b_i   = x_{i+1} - B u - A x - b
    /// res_d     = [-lower + l + t_l;  -upper + u - t_u;  -sl + ls + t_ls;  -su + us + t_us]
    /// res_m     = lam .* t - m
    /// ```
    ///
    /// and `mu` is the mean of `lam .* t` over all inequality rows.
    pub fn update(&mut self, qp: &OcpQp<T>, it: &OcpQpIterate<T>) -> Result<(), QpError> {
        self.check_dims(qp, it)?;

        let dim = qp.dim();
        let N = dim.N;
        let one = T::one();

        let mut vo = 0; // into ux / res_g
        let mut eo = 0; // into pi / res_b
        let mut co = 0; // into lam, t / res_d, res_m
        let mut prev_pi: &[T] = &[];
        let mut gap = T::zero();

        for i in 0..=N {
            let (nu, nx) = (dim.nu[i], dim.nx[i]);
            let (nb, ng, ns) = (dim.nb[i], dim.ng[i], dim.ns[i]);
            let nux = nu + nx;
            let nv = dim.nv(i);
            let nc = dim.nc(i);

            let v = &it.ux[vo..vo + nv];
            let (ux, s) = v.split_at(nux);
            let (sl, su) = s.split_at(ns);

            let lam = &it.lam[co..co + nc];
            let t = &it.t[co..co + nc];
            let (lam_lb, rest) = lam.split_at(nb);
            let (lam_lg, rest) = rest.split_at(ng);
            let (lam_ub, rest) = rest.split_at(nb);
            let (lam_ug, rest) = rest.split_at(ng);
            let (lam_ls, lam_us) = rest.split_at(ns);
            let lam_l = &lam[..nb + ng];
            let lam_u = &lam[nb + ng..2 * (nb + ng)];

            let d = qp.d(i);
            let idxb = qp.idxb(i);
            let idxs = qp.idxs(i);
            let RSQ = qp.RSQrq(i);
            let DCt = qp.DCt(i);
            let rqz = qp.rqz(i);
            let Z = qp.Z(i);

            // stationarity
            let rg = &mut self.res_g[vo..vo + nv];
            let (rg_ux, rg_s) = rg.split_at_mut(nux);
            let (rg_sl, rg_su) = rg_s.split_at_mut(ns);

            rg_ux.copy_from(&rqz[..nux]);
            RSQ.sym(MatrixTriangle::Tril).symv(rg_ux, ux, one, one);

            if i < N {
                let pi = &it.pi[eo..eo + dim.ne(i)];
                qp.BAbt(i).gemv_leading(rg_ux, pi, one, one);
            }
            if i > 0 {
                rg_ux[nu..].axpby(-one, prev_pi, one);
            }

            let tmp_nb = &mut self.tmp_nb[..nb];
            tmp_nb.waxpby(one, lam_lb, -one, lam_ub);
            rg_ux.scatter_add(one, tmp_nb, idxb);

            let tmp_ng = &mut self.tmp_ng[..ng];
            tmp_ng.waxpby(one, lam_lg, -one, lam_ug);
            DCt.gemv(rg_ux, tmp_ng, one, one);

            rg_sl.gather(one, lam_l, idxs);
            rg_sl.axpby(one, lam_ls, one).axpby(one, &rqz[nux..nux + ns], one);
            for (r, &z, &x) in izip!(rg_sl.iter_mut(), &Z[..ns], sl) {
                *r += z * x;
            }

            rg_su.gather(one, lam_u, idxs);
            rg_su.axpby(one, lam_us, one).axpby(one, &rqz[nux + ns..], one);
            for (r, &z, &x) in izip!(rg_su.iter_mut(), &Z[ns..], su) {
                *r += z * x;
            }

            // dynamics
            if i < N {
                let ne = dim.ne(i);
                let nu1 = dim.nu[i + 1];
                let x_next = &it.ux[vo + nv + nu1..vo + nv + nu1 + ne];
                let rb = &mut self.res_b[eo..eo + ne];
                rb.copy_from(qp.b(i));
                qp.BAbt(i).gemv_leading_t(rb, ux, -one, -one);
                rb.axpby(one, x_next, one);

                prev_pi = &it.pi[eo..eo + ne];
                eo += ne;
            }

            // slack consistency, stored upper bounds are negated
            let rd = &mut self.res_d[co..co + nc];
            let (rd_l, rest) = rd.split_at_mut(nb + ng);
            let (rd_u, rest) = rest.split_at_mut(nb + ng);
            let (rd_ls, rd_us) = rest.split_at_mut(ns);

            // negated constraint values, shared by both sides
            let (rd_lb, rd_lg) = rd_l.split_at_mut(nb);
            rd_lb.gather(-one, ux, idxb);
            DCt.t().gemv(rd_lg, ux, -one, T::zero());
            rd_u.copy_from(rd_l);

            for (j, &k) in idxs.iter().enumerate() {
                rd_l[k] -= sl[j];
                rd_u[k] += su[j];
            }

            rd_l.axpby(one, &d[..nb + ng], one).axpby(one, &t[..nb + ng], one);
            rd_u.axpby(-one, &d[nb + ng..2 * (nb + ng)], one)
                .axpby(-one, &t[nb + ng..2 * (nb + ng)], one);

            let d_s = &d[2 * (nb + ng)..];
            let t_s = &t[2 * (nb + ng)..];
            rd_ls.waxpby(-one, sl, one, &d_s[..ns]).axpby(one, &t_s[..ns], one);
            rd_us.waxpby(-one, su, one, &d_s[ns..]).axpby(one, &t_s[ns..], one);

            // complementarity
            let rm = &mut self.res_m[co..co + nc];
            gap += rm.muldot(lam, t);
            rm.axpby(-one, qp.m(i), one);

            vo += nv;
            co += nc;
        }

        let nct = dim.nct();
        self.mu = if nct > 0 { gap / nct.as_T() } else { T::zero() };

        Ok(())
    }
}

/// Evaluates the KKT residuals of a structured QP at `it` into `res`.
pub fn compute_ocp_residuals<T: FloatT>(
    qp: &OcpQp<T>,
    it: &OcpQpIterate<T>,
    res: &mut OcpQpResiduals<T>,
) -> Result<(), QpError> {
    res.update(qp, it)
}
