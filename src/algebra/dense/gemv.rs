#![allow(non_snake_case)]

use crate::algebra::*;

impl<S, T> MatrixVectorMultiply for DenseStorageMatrix<S, T>
where
    S: AsRef<[T]>,
    T: FloatT,
{
    type T = T;
    // implements y = aA*x + by
    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let (m, n) = self.size();
        assert!(n == x.len() && m == y.len());

        if b == T::zero() {
            y.set(T::zero());
        } else {
            y.scale(b);
        }
        for (col, &xj) in x.iter().enumerate() {
            let axj = a * xj;
            for (yi, &Aij) in y.iter_mut().zip(self.col_slice(col)) {
                *yi += Aij * axj;
            }
        }
    }
}

impl<S, T> MatrixVectorMultiply for Adjoint<'_, DenseStorageMatrix<S, T>>
where
    S: AsRef<[T]>,
    T: FloatT,
{
    type T = T;
    // implements y = aA'*x + by
    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let (m, n) = self.src.size(); //NB: size of A, not A'
        assert!(m == x.len() && n == y.len());

        // columns of A are rows of A', so each entry of y is a dot product
        for (col, yj) in y.iter_mut().enumerate() {
            let ycol = a * self.src.col_slice(col).dot(x);
            *yj = if b == T::zero() { ycol } else { ycol + b * (*yj) };
        }
    }
}

impl<S, T> DenseStorageMatrix<S, T>
where
    S: AsRef<[T]>,
    T: FloatT,
{
    /// `y = a*A[0..k,:]*x + b*y` over the leading `k = y.len()` rows.
    pub fn gemv_leading(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let (m, n) = self.size();
        assert!(n == x.len() && y.len() <= m);

        if b == T::zero() {
            y.set(T::zero());
        } else {
            y.scale(b);
        }
        for (col, &xj) in x.iter().enumerate() {
            let axj = a * xj;
            for (yi, &Aij) in y.iter_mut().zip(self.col_slice(col)) {
                *yi += Aij * axj;
            }
        }
    }

    /// `y = a*A[0..k,:]'*x + b*y` over the leading `k = x.len()` rows.
    pub fn gemv_leading_t(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let (m, n) = self.size();
        let k = x.len();
        assert!(n == y.len() && k <= m);

        for (col, yj) in y.iter_mut().enumerate() {
            let ycol = a * self.col_slice(col)[..k].dot(x);
            *yj = if b == T::zero() { ycol } else { ycol + b * (*yj) };
        }
    }
}

#[test]
fn test_gemv() {
    let (m, n) = (2, 3);
    let a = vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
    let A = Matrix::new_from_slice((m, n), &a);

    let x = vec![1., 2., 3.];
    let mut y = vec![-1., -2.];
    A.gemv(&mut y, &x, 2.0, 3.0);
    assert!(y == [25.0, 58.0]);

    let x = vec![1., 2.];
    let mut y = vec![-1., -2., -3.];
    A.t().gemv(&mut y, &x, 2.0, 3.0);
    assert!(y == [15.0, 18.0, 21.0]);
}

#[test]
fn test_gemv_empty() {
    // zero column matrices leave y scaled only
    let A = Matrix::<f64>::zeros((2, 0));
    let mut y = vec![1., 2.];
    A.gemv(&mut y, &[], 1.0, 2.0);
    assert_eq!(y, [2., 4.]);

    let mut z: Vec<f64> = vec![];
    A.t().gemv(&mut z, &y, 1.0, 1.0);
    assert!(z.is_empty());
}

#[test]
fn test_gemv_leading() {
    // the last row must never be referenced
    #[rustfmt::skip]
    let A = Matrix::from(&[
        [1., 2.],
        [3., 4.],
        [9., 9.],
    ]);
    let mut y = vec![1., 1.];
    A.gemv_leading(&mut y, &[1., -1.], 1.0, 1.0);
    assert_eq!(y, [0., 0.]);

    let mut z = vec![1., 2.];
    A.gemv_leading_t(&mut z, &[1., 1.], 2.0, 0.0);
    assert_eq!(z, [8., 12.]);
}
