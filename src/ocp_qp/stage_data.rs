#![allow(non_snake_case)]

use super::error::{check_indices, check_len, QpError};
use super::fields::{FieldKind, OcpQpField};
use super::qp::OcpQp;
use crate::algebra::*;

/// User side data of one stage, for loading a whole problem at once with
/// [`OcpQp::load_stages`].
///
/// Matrices use the orientation of the matching [`OcpQpField`] and the
/// storage order passed to the loader.  Upper bounds are given as is, not
/// negated.  An empty float slice leaves that field at zero, while the
/// index arrays must always have their full length.
#[derive(Debug, Clone, Copy, Default)]
pub struct OcpQpStageData<'a, T = f64> {
    // dynamics, empty at the last stage
    pub A: &'a [T],
    pub B: &'a [T],
    pub b: &'a [T],

    // cost
    pub Q: &'a [T],
    pub S: &'a [T],
    pub R: &'a [T],
    pub q: &'a [T],
    pub r: &'a [T],

    // simple bounds on the entries `idxb` of `[u; x]`
    pub idxb: &'a [usize],
    pub lb: &'a [T],
    pub ub: &'a [T],

    // general constraints `lg <= D u + C x <= ug`
    pub C: &'a [T],
    pub D: &'a [T],
    pub lg: &'a [T],
    pub ug: &'a [T],

    // soft constraints on the rows `idxs` of `[bounds; general]`
    pub idxs: &'a [usize],
    pub Zl: &'a [T],
    pub Zu: &'a [T],
    pub zl: &'a [T],
    pub zu: &'a [T],
    pub ls: &'a [T],
    pub us: &'a [T],
}

impl<'a, T> OcpQpStageData<'a, T> {
    fn float_fields(&self) -> [(OcpQpField, &'a [T]); 20] {
        use OcpQpField as F;
        [
            (F::A, self.A),
            (F::B, self.B),
            (F::BVec, self.b),
            (F::Q, self.Q),
            (F::S, self.S),
            (F::R, self.R),
            (F::QVec, self.q),
            (F::RVec, self.r),
            (F::Lb, self.lb),
            (F::Ub, self.ub),
            (F::C, self.C),
            (F::D, self.D),
            (F::Lg, self.lg),
            (F::Ug, self.ug),
            (F::Zl, self.Zl),
            (F::Zu, self.Zu),
            (F::ZlVec, self.zl),
            (F::ZuVec, self.zu),
            (F::Ls, self.ls),
            (F::Us, self.us),
        ]
    }

    fn index_fields(&self) -> [(OcpQpField, &'a [usize]); 2] {
        [(OcpQpField::Idxb, self.idxb), (OcpQpField::Idxs, self.idxs)]
    }
}

impl<T> OcpQp<T>
where
    T: FloatT,
{
    /// Loads every stage of the problem in one call, one entry of
    /// `stages` per stage `0..=N`.
    ///
    /// All lengths and indices are checked before anything is written,
    /// so on error the QP is left unchanged.  On success every floating
    /// point field not supplied is zero, including the complementarity
    /// offsets `m`.
    pub fn load_stages(&mut self, stages: &[OcpQpStageData<'_, T>], order: MatrixOrder) -> Result<(), QpError> {
        check_len(self.dim().stages(), stages.len())?;

        for (i, s) in stages.iter().enumerate() {
            for (field, data) in s.float_fields() {
                if !data.is_empty() {
                    check_len(self.field_len(field, i)?, data.len())?;
                }
            }
            for (field, data) in s.index_fields() {
                check_len(self.field_len(field, i)?, data.len())?;
                check_indices(data, self.index_limit(field, i))?;
            }
        }

        self.clear_floats();

        for (i, s) in stages.iter().enumerate() {
            for (field, data) in s.float_fields() {
                if data.is_empty() {
                    continue;
                }
                match field.kind() {
                    FieldKind::Matrix => self.set_matrix(field, i, data, order)?,
                    _ => self.set_vector(field, i, data)?,
                }
            }
            for (field, data) in s.index_fields() {
                self.set_index(field, i, data)?;
            }
        }

        log::debug!("loaded OCP QP data for {} stages, {:?}", stages.len(), order);
        Ok(())
    }
}
