//! Single stage dense QP
//!
//! ```text
//! min  1/2 v'Hv + g'v
//! s.t. A v = b
//!      lb <= v[idxb] <= ub
//!      lg <= Ct'v    <= ug
//! ```
//!
//! Constraint data is packed as `d = [lb; lg; -ub; -ug]`, the same
//! convention as a single stage of an [`OcpQp`](crate::ocp_qp::OcpQp).

#![allow(non_snake_case)]

use crate::algebra::*;
use crate::ocp_qp::{check_len, QpError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dimensions of a [`DenseQp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DenseQpDim {
    /// primal variables
    pub nv: usize,
    /// equality constraints
    pub ne: usize,
    /// simple bounds
    pub nb: usize,
    /// general inequalities
    pub ng: usize,
}

impl DenseQpDim {
    pub fn new(nv: usize, ne: usize, nb: usize, ng: usize) -> Self {
        Self { nv, ne, nb, ng }
    }

    /// inequality rows, both sides
    pub fn nc(&self) -> usize {
        2 * (self.nb + self.ng)
    }
}

/// Dense QP data.  Only the lower triangle of `H` is referenced.
#[derive(Debug, Clone)]
pub struct DenseQp<T: FloatT = f64> {
    pub dim: DenseQpDim,
    /// Hessian, `nv x nv`
    pub H: Matrix<T>,
    /// gradient
    pub g: Vec<T>,
    /// equality constraint matrix, `ne x nv`
    pub A: Matrix<T>,
    pub b: Vec<T>,
    /// transposed general constraint matrix, `nv x ng`
    pub Ct: Matrix<T>,
    /// bounded variable positions
    pub idxb: Vec<usize>,
    /// constraint data `[lb; lg; -ub; -ug]`
    pub d: Vec<T>,
    /// complementarity offset, same packing as `d`
    pub m: Vec<T>,
}

impl<T> DenseQp<T>
where
    T: FloatT,
{
    /// Zeroed QP with bounds on the first `nb` variables.
    pub fn new(dim: DenseQpDim) -> Self {
        let DenseQpDim { nv, ne, nb, ng } = dim;
        assert!(nb <= nv);
        Self {
            dim,
            H: Matrix::zeros((nv, nv)),
            g: vec![T::zero(); nv],
            A: Matrix::zeros((ne, nv)),
            b: vec![T::zero(); ne],
            Ct: Matrix::zeros((nv, ng)),
            idxb: (0..nb).collect(),
            d: vec![T::zero(); dim.nc()],
            m: vec![T::zero(); dim.nc()],
        }
    }

    pub fn set_idxb(&mut self, idxb: &[usize]) -> Result<(), QpError> {
        check_len(self.dim.nb, idxb.len())?;
        let limit = self.dim.nv;
        if let Some(&index) = idxb.iter().find(|&&k| k >= limit) {
            return Err(QpError::IndexOutOfRange { index, limit });
        }
        self.idxb.copy_from_slice(idxb);
        Ok(())
    }

    // offsets of [lb, lg, ub, ug] within d
    fn offsets(&self) -> [usize; 4] {
        let DenseQpDim { nb, ng, .. } = self.dim;
        [0, nb, nb + ng, 2 * nb + ng]
    }

    fn set_block(&mut self, start: usize, len: usize, src: &[T], negate: bool) -> Result<(), QpError> {
        check_len(len, src.len())?;
        let dst = &mut self.d[start..start + len];
        if negate {
            dst.scalarop_from(|v| -v, src);
        } else {
            dst.copy_from(src);
        }
        Ok(())
    }

    fn get_block(&self, start: usize, len: usize, out: &mut [T], negate: bool) -> Result<(), QpError> {
        check_len(len, out.len())?;
        let src = &self.d[start..start + len];
        if negate {
            out.scalarop_from(|v| -v, src);
        } else {
            out.copy_from(src);
        }
        Ok(())
    }

    pub fn set_lb(&mut self, lb: &[T]) -> Result<(), QpError> {
        self.set_block(self.offsets()[0], self.dim.nb, lb, false)
    }
    pub fn get_lb(&self, lb: &mut [T]) -> Result<(), QpError> {
        self.get_block(self.offsets()[0], self.dim.nb, lb, false)
    }

    /// Stores `-ub`.
    pub fn set_ub(&mut self, ub: &[T]) -> Result<(), QpError> {
        self.set_block(self.offsets()[2], self.dim.nb, ub, true)
    }
    pub fn get_ub(&self, ub: &mut [T]) -> Result<(), QpError> {
        self.get_block(self.offsets()[2], self.dim.nb, ub, true)
    }

    pub fn set_lg(&mut self, lg: &[T]) -> Result<(), QpError> {
        self.set_block(self.offsets()[1], self.dim.ng, lg, false)
    }
    pub fn get_lg(&self, lg: &mut [T]) -> Result<(), QpError> {
        self.get_block(self.offsets()[1], self.dim.ng, lg, false)
    }

    /// Stores `-ug`.
    pub fn set_ug(&mut self, ug: &[T]) -> Result<(), QpError> {
        self.set_block(self.offsets()[3], self.dim.ng, ug, true)
    }
    pub fn get_ug(&self, ug: &mut [T]) -> Result<(), QpError> {
        self.get_block(self.offsets()[3], self.dim.ng, ug, true)
    }
}
