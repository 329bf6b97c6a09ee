//! Dense linear algebra for packed QP data.
//!
//! All internal math for the QP containers and the residual kernels goes
//! through the traits defined here, implemented generically for floats of
//! type [`FloatT`].  Matrices are stored in column major format, either
//! owned ([`Matrix`]) or as views borrowed from an arena
//! ([`BorrowedMatrix`], [`BorrowedMatrixMut`]).

mod dense;
mod floats;
mod math_traits;
mod matrix_types;
mod vecmath;

pub use dense::*;
pub use floats::*;
pub use math_traits::*;
pub use matrix_types::*;
