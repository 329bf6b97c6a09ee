#![allow(non_snake_case)]

use super::error::QpError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-stage dimensions of a structured OCP QP over a horizon of `N`
/// transitions, i.e. `N+1` stages indexed `0..=N`.
///
/// Stage `i` carries `nx[i]` states, `nu[i]` inputs, `nb[i] = nbu[i] + nbx[i]`
/// simple bounds (input bounds first), `ng[i]` general inequalities and
/// `ns[i]` soft constraint slacks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OcpQpDim {
    pub N: usize,
    pub nx: Vec<usize>,
    pub nu: Vec<usize>,
    pub nb: Vec<usize>,
    pub nbu: Vec<usize>,
    pub nbx: Vec<usize>,
    pub ng: Vec<usize>,
    pub ns: Vec<usize>,
}

impl OcpQpDim {
    /// Builds dimensions from per-stage arrays, all of length `N+1`.
    pub fn new(
        nx: &[usize],
        nu: &[usize],
        nbu: &[usize],
        nbx: &[usize],
        ng: &[usize],
        ns: &[usize],
    ) -> Result<Self, QpError> {
        if nx.is_empty() {
            return Err(QpError::IncompatibleDimension {
                expected: 1,
                found: 0,
            });
        }
        let stages = nx.len();
        for arr in [nu, nbu, nbx, ng, ns] {
            if arr.len() != stages {
                return Err(QpError::IncompatibleDimension {
                    expected: stages,
                    found: arr.len(),
                });
            }
        }
        check_bound_split(nx, nu, nbu, nbx)?;

        let nb = nbu.iter().zip(nbx).map(|(u, x)| u + x).collect();

        Ok(Self {
            N: stages - 1,
            nx: nx.to_vec(),
            nu: nu.to_vec(),
            nb,
            nbu: nbu.to_vec(),
            nbx: nbx.to_vec(),
            ng: ng.to_vec(),
            ns: ns.to_vec(),
        })
    }

    /// Uniform dimensions across every stage, with `nu = 0` and no
    /// input bounds at the terminal stage.
    pub fn uniform(
        N: usize,
        nx: usize,
        nu: usize,
        nbu: usize,
        nbx: usize,
        ng: usize,
        ns: usize,
    ) -> Result<Self, QpError> {
        let mut nu_v = vec![nu; N + 1];
        let mut nbu_v = vec![nbu; N + 1];
        nu_v[N] = 0;
        nbu_v[N] = 0;
        Self::new(
            &vec![nx; N + 1],
            &nu_v,
            &nbu_v,
            &vec![nbx; N + 1],
            &vec![ng; N + 1],
            &vec![ns; N + 1],
        )
    }

    /// number of stages, `N+1`
    pub fn stages(&self) -> usize {
        self.N + 1
    }

    /// `nu + nx` at stage `i`
    pub fn nux(&self, i: usize) -> usize {
        self.nu[i] + self.nx[i]
    }

    /// primal variables at stage `i`, slacks included
    pub fn nv(&self, i: usize) -> usize {
        self.nu[i] + self.nx[i] + 2 * self.ns[i]
    }

    /// equality constraints of transition `i`
    pub fn ne(&self, i: usize) -> usize {
        self.nx[i + 1]
    }

    /// inequality rows at stage `i`: both sides of every bound, general
    /// constraint and slack
    pub fn nc(&self, i: usize) -> usize {
        2 * (self.nb[i] + self.ng[i] + self.ns[i])
    }

    /// total primal variables
    pub fn nvt(&self) -> usize {
        (0..=self.N).map(|i| self.nv(i)).sum()
    }

    /// total equality constraints
    pub fn net(&self) -> usize {
        (0..self.N).map(|i| self.ne(i)).sum()
    }

    /// total inequality rows
    pub fn nct(&self) -> usize {
        (0..=self.N).map(|i| self.nc(i)).sum()
    }

    /// total simple bounds
    pub fn nbt(&self) -> usize {
        self.nb.iter().sum()
    }

    /// total soft constraint slacks
    pub fn nst(&self) -> usize {
        self.ns.iter().sum()
    }

    pub(crate) fn check_stage(&self, stage: usize) -> Result<(), QpError> {
        if stage > self.N {
            return Err(QpError::StageOutOfRange {
                stage,
                max: self.N,
            });
        }
        Ok(())
    }

    // stages with an outgoing transition
    pub(crate) fn check_transition(&self, stage: usize) -> Result<(), QpError> {
        if stage >= self.N {
            return Err(QpError::StageOutOfRange {
                stage,
                max: self.N.saturating_sub(1),
            });
        }
        Ok(())
    }
}

pub(crate) fn check_bound_split(
    nx: &[usize],
    nu: &[usize],
    nbu: &[usize],
    nbx: &[usize],
) -> Result<(), QpError> {
    for stage in 0..nx.len() {
        if nbu[stage] > nu[stage] || nbx[stage] > nx[stage] {
            return Err(QpError::BadBoundSplit { stage });
        }
    }
    Ok(())
}
