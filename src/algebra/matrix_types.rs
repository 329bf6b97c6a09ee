/// Matrix shape marker for triangular matrices
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum MatrixTriangle {
    /// Upper triangular matrix
    Triu,
    /// Lower triangular matrix
    Tril,
}

/// Storage order of user-facing dense arrays passed to or read from
/// the packed QP containers.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum MatrixOrder {
    /// Column major (Fortran) ordering
    #[default]
    ColMajor,
    /// Row major (C) ordering
    RowMajor,
}

impl MatrixOrder {
    /// Linear position of entry `(i, j)` of an `m x n` array.
    #[inline]
    pub fn index(&self, m: usize, n: usize, i: usize, j: usize) -> usize {
        match self {
            MatrixOrder::ColMajor => i + j * m,
            MatrixOrder::RowMajor => i * n + j,
        }
    }
}

/// Adjoint of a matrix
#[derive(Debug, Clone, Copy)]
pub struct Adjoint<'a, M> {
    pub src: &'a M,
}

/// Symmetric view of a matrix.  Only the triangle given by `uplo`
/// is ever referenced.  For a tall matrix the view covers the leading
/// square block.
#[derive(Debug, Clone, Copy)]
pub struct Symmetric<'a, M> {
    pub src: &'a M,
    pub uplo: MatrixTriangle,
}
