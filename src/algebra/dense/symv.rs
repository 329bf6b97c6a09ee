#![allow(non_snake_case)]

use crate::algebra::*;

impl<S, T> SymMatrixVectorMultiply for Symmetric<'_, DenseStorageMatrix<S, T>>
where
    S: AsRef<[T]>,
    T: FloatT,
{
    type T = T;
    // implements y = aA*x + by, reading only the populated triangle
    // of the leading n x n block
    fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let (m, n) = self.src.size();
        assert!(m >= n);
        assert!(n == x.len() && n == y.len());

        if b == T::zero() {
            y.set(T::zero());
        } else {
            y.scale(b);
        }
        for col in 0..n {
            let Acol = self.src.col_slice(col);
            let axc = a * x[col];
            let mut acc = T::zero();

            // off diagonal part of the stored triangle, plus its reflection
            let rows = match self.uplo {
                MatrixTriangle::Triu => 0..col,
                MatrixTriangle::Tril => (col + 1)..n,
            };
            for row in rows {
                y[row] += Acol[row] * axc;
                acc += Acol[row] * x[row];
            }
            y[col] += Acol[col] * axc + a * acc;
        }
    }
}

#[test]
fn test_symv() {
    #[rustfmt::skip]
    let A = Matrix::from(&[
        [ 1.,  2.,   4.],
        [ 0.,  3.,   5.],
        [ 0.,  0.,   6.],
    ]);

    let x = vec![1., -2., 3.];
    let mut y = vec![-4., -1., 3.];
    A.sym(MatrixTriangle::Triu).symv(&mut y, &x, 2.0, 3.0);
    assert_eq!(y, [6.0, 19.0, 33.0]);

    // same matrix held in the lower triangle, with junk above
    #[rustfmt::skip]
    let A = Matrix::from(&[
        [ 1., 99., 99.],
        [ 2.,  3., 99.],
        [ 4.,  5.,  6.],
    ]);
    let mut y = vec![-4., -1., 3.];
    A.sym(MatrixTriangle::Tril).symv(&mut y, &x, 2.0, 3.0);
    assert_eq!(y, [6.0, 19.0, 33.0]);

    // leading block of a tall matrix, with junk in the last row
    #[rustfmt::skip]
    let A = Matrix::from(&[
        [ 1., 99., 99.],
        [ 2.,  3., 99.],
        [ 4.,  5.,  6.],
        [77., 77., 77.],
    ]);
    let mut y = vec![-4., -1., 3.];
    A.sym(MatrixTriangle::Tril).symv(&mut y, &x, 2.0, 3.0);
    assert_eq!(y, [6.0, 19.0, 33.0]);
}
