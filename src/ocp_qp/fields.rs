#![allow(non_snake_case)]

use super::error::{check_indices, check_len, QpError};
use super::qp::OcpQp;
use crate::algebra::*;
use std::fmt;
use std::str::FromStr;

/// Named data fields of an [`OcpQp`], addressed per stage.
///
/// Matrices are given in the user's orientation (e.g. `A` is
/// `nx[i+1] x nx[i]`) and are transposed into the packed blocks as
/// needed.  Upper bound fields are sign-correct: they are negated on
/// store and on load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OcpQpField {
    /// state transition matrix, `nx[i+1] x nx[i]`
    A,
    /// input matrix, `nx[i+1] x nu[i]`
    B,
    /// state cost, `nx x nx`
    Q,
    /// input/state cross cost, `nu x nx`
    S,
    /// input cost, `nu x nu`
    R,
    /// general constraints on states, `ng x nx`
    C,
    /// general constraints on inputs, `ng x nu`
    D,
    /// dynamics offset `b`
    BVec,
    /// linear state cost `q`
    QVec,
    /// linear input cost `r`
    RVec,
    Lb,
    Ub,
    Lbu,
    Ubu,
    Lbx,
    Ubx,
    Lg,
    Ug,
    /// quadratic slack weights
    Zl,
    Zu,
    /// linear slack weights
    ZlVec,
    ZuVec,
    /// soft constraint slack bounds
    Ls,
    Us,
    Idxb,
    Idxs,
}

/// Kind of data held by a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Matrix,
    Vector,
    Index,
}

impl FieldKind {
    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Matrix => "matrix",
            FieldKind::Vector => "vector",
            FieldKind::Index => "index",
        }
    }
}

impl OcpQpField {
    pub const ALL: [OcpQpField; 26] = [
        OcpQpField::A,
        OcpQpField::B,
        OcpQpField::Q,
        OcpQpField::S,
        OcpQpField::R,
        OcpQpField::C,
        OcpQpField::D,
        OcpQpField::BVec,
        OcpQpField::QVec,
        OcpQpField::RVec,
        OcpQpField::Lb,
        OcpQpField::Ub,
        OcpQpField::Lbu,
        OcpQpField::Ubu,
        OcpQpField::Lbx,
        OcpQpField::Ubx,
        OcpQpField::Lg,
        OcpQpField::Ug,
        OcpQpField::Zl,
        OcpQpField::Zu,
        OcpQpField::ZlVec,
        OcpQpField::ZuVec,
        OcpQpField::Ls,
        OcpQpField::Us,
        OcpQpField::Idxb,
        OcpQpField::Idxs,
    ];

    /// Conventional short name, e.g. `"ub"` or `"Zl"`.
    pub fn name(&self) -> &'static str {
        use OcpQpField::*;
        match self {
            A => "A",
            B => "B",
            Q => "Q",
            S => "S",
            R => "R",
            C => "C",
            D => "D",
            BVec => "b",
            QVec => "q",
            RVec => "r",
            Lb => "lb",
            Ub => "ub",
            Lbu => "lbu",
            Ubu => "ubu",
            Lbx => "lbx",
            Ubx => "ubx",
            Lg => "lg",
            Ug => "ug",
            Zl => "Zl",
            Zu => "Zu",
            ZlVec => "zl",
            ZuVec => "zu",
            Ls => "ls",
            Us => "us",
            Idxb => "idxb",
            Idxs => "idxs",
        }
    }

    pub fn kind(&self) -> FieldKind {
        use OcpQpField::*;
        match self {
            A | B | Q | S | R | C | D => FieldKind::Matrix,
            Idxb | Idxs => FieldKind::Index,
            _ => FieldKind::Vector,
        }
    }

    /// Fields attached to a transition `i -> i+1` rather than to a stage.
    pub fn is_dynamics(&self) -> bool {
        matches!(self, OcpQpField::A | OcpQpField::B | OcpQpField::BVec)
    }

    fn expect_kind(&self, expected: FieldKind) -> Result<(), QpError> {
        if self.kind() != expected {
            return Err(QpError::FieldKind {
                field: self.name(),
                expected: expected.as_str(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for OcpQpField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for OcpQpField {
    type Err = QpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lls" => Ok(OcpQpField::Ls),
            "lus" => Ok(OcpQpField::Us),
            _ => OcpQpField::ALL
                .iter()
                .find(|f| f.name() == s)
                .copied()
                .ok_or_else(|| QpError::UnknownField(s.to_string())),
        }
    }
}

// where a matrix field lives in the packed blocks
#[derive(Clone, Copy)]
enum Block {
    BAbt,
    RSQrq,
    DCt,
}

struct MatSlot {
    block: Block,
    // user shape
    rows: usize,
    cols: usize,
    // top left corner in the packed block
    row0: usize,
    col0: usize,
    transposed: bool,
}

#[derive(Clone, Copy)]
enum Store {
    B,
    Rqz,
    D,
    Z,
}

struct VecSlot {
    store: Store,
    offset: usize,
    len: usize,
    negate: bool,
    // copy also written into the last row of a packed block, from this column
    aug_row: Option<(Block, usize)>,
}

impl<T> OcpQp<T>
where
    T: FloatT,
{
    fn check_field_stage(&self, field: OcpQpField, stage: usize) -> Result<(), QpError> {
        if field.is_dynamics() {
            self.dim().check_transition(stage)
        } else {
            self.dim().check_stage(stage)
        }
    }

    fn matrix_slot(&self, field: OcpQpField, stage: usize) -> Result<MatSlot, QpError> {
        field.expect_kind(FieldKind::Matrix)?;
        self.check_field_stage(field, stage)?;

        let dim = self.dim();
        let (nu, nx, ng) = (dim.nu[stage], dim.nx[stage], dim.ng[stage]);
        let slot = |block, rows, cols, row0, col0, transposed| MatSlot {
            block,
            rows,
            cols,
            row0,
            col0,
            transposed,
        };

        let s = match field {
            OcpQpField::A => slot(Block::BAbt, dim.nx[stage + 1], nx, nu, 0, true),
            OcpQpField::B => slot(Block::BAbt, dim.nx[stage + 1], nu, 0, 0, true),
            OcpQpField::Q => slot(Block::RSQrq, nx, nx, nu, nu, false),
            OcpQpField::S => slot(Block::RSQrq, nu, nx, nu, 0, true),
            OcpQpField::R => slot(Block::RSQrq, nu, nu, 0, 0, false),
            OcpQpField::C => slot(Block::DCt, ng, nx, nu, 0, true),
            OcpQpField::D => slot(Block::DCt, ng, nu, 0, 0, true),
            _ => unreachable!(),
        };
        Ok(s)
    }

    fn vector_slot(&self, field: OcpQpField, stage: usize) -> Result<VecSlot, QpError> {
        field.expect_kind(FieldKind::Vector)?;
        self.check_field_stage(field, stage)?;

        let dim = self.dim();
        let (nu, nx) = (dim.nu[stage], dim.nx[stage]);
        let (nb, nbu, nbx) = (dim.nb[stage], dim.nbu[stage], dim.nbx[stage]);
        let (ng, ns) = (dim.ng[stage], dim.ns[stage]);

        let slot = |store, offset, len, negate| VecSlot {
            store,
            offset,
            len,
            negate,
            aug_row: None,
        };

        let s = match field {
            OcpQpField::BVec => VecSlot {
                aug_row: Some((Block::BAbt, 0)),
                ..slot(Store::B, 0, dim.nx[stage + 1], false)
            },
            OcpQpField::RVec => VecSlot {
                aug_row: Some((Block::RSQrq, 0)),
                ..slot(Store::Rqz, 0, nu, false)
            },
            OcpQpField::QVec => VecSlot {
                aug_row: Some((Block::RSQrq, nu)),
                ..slot(Store::Rqz, nu, nx, false)
            },
            OcpQpField::Lb => slot(Store::D, 0, nb, false),
            OcpQpField::Ub => slot(Store::D, nb + ng, nb, true),
            OcpQpField::Lbu => slot(Store::D, 0, nbu, false),
            OcpQpField::Ubu => slot(Store::D, nb + ng, nbu, true),
            OcpQpField::Lbx => slot(Store::D, nbu, nbx, false),
            OcpQpField::Ubx => slot(Store::D, nb + ng + nbu, nbx, true),
            OcpQpField::Lg => slot(Store::D, nb, ng, false),
            OcpQpField::Ug => slot(Store::D, 2 * nb + ng, ng, true),
            OcpQpField::Zl => slot(Store::Z, 0, ns, false),
            OcpQpField::Zu => slot(Store::Z, ns, ns, false),
            OcpQpField::ZlVec => slot(Store::Rqz, nu + nx, ns, false),
            OcpQpField::ZuVec => slot(Store::Rqz, nu + nx + ns, ns, false),
            OcpQpField::Ls => slot(Store::D, 2 * nb + 2 * ng, ns, false),
            OcpQpField::Us => slot(Store::D, 2 * nb + 2 * ng + ns, ns, false),
            _ => unreachable!(),
        };
        Ok(s)
    }

    fn block_mut(&mut self, block: Block, stage: usize) -> BorrowedMatrixMut<'_, T> {
        match block {
            Block::BAbt => self.BAbt_mut(stage),
            Block::RSQrq => self.RSQrq_mut(stage),
            Block::DCt => self.DCt_mut(stage),
        }
    }

    fn block(&self, block: Block, stage: usize) -> BorrowedMatrix<'_, T> {
        match block {
            Block::BAbt => self.BAbt(stage),
            Block::RSQrq => self.RSQrq(stage),
            Block::DCt => self.DCt(stage),
        }
    }

    fn store_mut(&mut self, store: Store, stage: usize) -> &mut [T] {
        match store {
            Store::B => self.b_mut(stage),
            Store::Rqz => self.rqz_mut(stage),
            Store::D => self.d_mut(stage),
            Store::Z => self.Z_mut(stage),
        }
    }

    fn store(&self, store: Store, stage: usize) -> &[T] {
        match store {
            Store::B => self.b(stage),
            Store::Rqz => self.rqz(stage),
            Store::D => self.d(stage),
            Store::Z => self.Z(stage),
        }
    }

    /// User facing `(rows, cols)` of a matrix field at `stage`.
    pub fn matrix_shape(&self, field: OcpQpField, stage: usize) -> Result<(usize, usize), QpError> {
        let s = self.matrix_slot(field, stage)?;
        Ok((s.rows, s.cols))
    }

    /// Length of a vector or index field at `stage`.
    pub fn field_len(&self, field: OcpQpField, stage: usize) -> Result<usize, QpError> {
        match field.kind() {
            FieldKind::Matrix => {
                let (m, n) = self.matrix_shape(field, stage)?;
                Ok(m * n)
            }
            FieldKind::Vector => Ok(self.vector_slot(field, stage)?.len),
            FieldKind::Index => {
                self.check_field_stage(field, stage)?;
                Ok(match field {
                    OcpQpField::Idxb => self.dim().nb[stage],
                    _ => self.dim().ns[stage],
                })
            }
        }
    }

    /// Copies a dense user matrix into its packed block.
    pub fn set_matrix(
        &mut self,
        field: OcpQpField,
        stage: usize,
        data: &[T],
        order: MatrixOrder,
    ) -> Result<(), QpError> {
        let s = self.matrix_slot(field, stage)?;
        check_len(s.rows * s.cols, data.len())?;

        let mut M = self.block_mut(s.block, stage);
        for j in 0..s.cols {
            for i in 0..s.rows {
                let v = data[order.index(s.rows, s.cols, i, j)];
                if s.transposed {
                    M[(s.row0 + j, s.col0 + i)] = v;
                } else {
                    M[(s.row0 + i, s.col0 + j)] = v;
                }
            }
        }
        Ok(())
    }

    /// Copies a matrix field out of its packed block.
    pub fn get_matrix(
        &self,
        field: OcpQpField,
        stage: usize,
        out: &mut [T],
        order: MatrixOrder,
    ) -> Result<(), QpError> {
        let s = self.matrix_slot(field, stage)?;
        check_len(s.rows * s.cols, out.len())?;

        let M = self.block(s.block, stage);
        for j in 0..s.cols {
            for i in 0..s.rows {
                out[order.index(s.rows, s.cols, i, j)] = if s.transposed {
                    M[(s.row0 + j, s.col0 + i)]
                } else {
                    M[(s.row0 + i, s.col0 + j)]
                };
            }
        }
        Ok(())
    }

    /// Copies a user vector into the packed data, negating upper bounds.
    pub fn set_vector(&mut self, field: OcpQpField, stage: usize, data: &[T]) -> Result<(), QpError> {
        let s = self.vector_slot(field, stage)?;
        check_len(s.len, data.len())?;

        let dst = &mut self.store_mut(s.store, stage)[s.offset..s.offset + s.len];
        if s.negate {
            dst.scalarop_from(|v| -v, data);
        } else {
            dst.copy_from(data);
        }

        if let Some((block, col0)) = s.aug_row {
            let mut M = self.block_mut(block, stage);
            let row = M.nrows() - 1;
            for (j, &v) in data.iter().enumerate() {
                M[(row, col0 + j)] = v;
            }
        }
        Ok(())
    }

    /// Copies a vector field out of the packed data, sign-correct.
    pub fn get_vector(&self, field: OcpQpField, stage: usize, out: &mut [T]) -> Result<(), QpError> {
        let s = self.vector_slot(field, stage)?;
        check_len(s.len, out.len())?;

        let src = &self.store(s.store, stage)[s.offset..s.offset + s.len];
        if s.negate {
            out.scalarop_from(|v| -v, src);
        } else {
            out.copy_from(src);
        }
        Ok(())
    }

    /// Sets `idxb` or `idxs` at `stage`, validating every entry.
    pub fn set_index(&mut self, field: OcpQpField, stage: usize, data: &[usize]) -> Result<(), QpError> {
        field.expect_kind(FieldKind::Index)?;
        self.check_field_stage(field, stage)?;

        check_indices(data, self.index_limit(field, stage))?;

        let dst = match field {
            OcpQpField::Idxb => self.idxb_mut(stage),
            _ => self.idxs_mut(stage),
        };
        check_len(dst.len(), data.len())?;
        dst.copy_from_slice(data);
        Ok(())
    }

    // exclusive upper bound on the entries of an index field
    pub(crate) fn index_limit(&self, field: OcpQpField, stage: usize) -> usize {
        let dim = self.dim();
        match field {
            OcpQpField::Idxb => dim.nux(stage),
            _ => dim.nb[stage] + dim.ng[stage],
        }
    }

    pub fn get_index(&self, field: OcpQpField, stage: usize, out: &mut [usize]) -> Result<(), QpError> {
        field.expect_kind(FieldKind::Index)?;
        self.check_field_stage(field, stage)?;

        let src = match field {
            OcpQpField::Idxb => self.idxb(stage),
            _ => self.idxs(stage),
        };
        check_len(src.len(), out.len())?;
        out.copy_from_slice(src);
        Ok(())
    }

    /// Sets any floating point field by name from column major data.
    pub fn set(&mut self, name: &str, stage: usize, data: &[T]) -> Result<(), QpError> {
        let field: OcpQpField = name.parse()?;
        match field.kind() {
            FieldKind::Matrix => self.set_matrix(field, stage, data, MatrixOrder::ColMajor),
            FieldKind::Vector => self.set_vector(field, stage, data),
            FieldKind::Index => Err(QpError::FieldKind {
                field: field.name(),
                expected: "floating point",
            }),
        }
    }

    /// Reads any floating point field by name into column major data.
    pub fn get(&self, name: &str, stage: usize, out: &mut [T]) -> Result<(), QpError> {
        let field: OcpQpField = name.parse()?;
        match field.kind() {
            FieldKind::Matrix => self.get_matrix(field, stage, out, MatrixOrder::ColMajor),
            FieldKind::Vector => self.get_vector(field, stage, out),
            FieldKind::Index => Err(QpError::FieldKind {
                field: field.name(),
                expected: "floating point",
            }),
        }
    }
}
