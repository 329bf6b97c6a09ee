//! __ocpqp__ provides the data layout and residual evaluation core of an
//! interior point solver for optimal control quadratic programs (OCP QPs),
//! the multi-stage problems arising in model predictive control:
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & \sum_{i=0}^{N} \frac{1}{2}\begin{bmatrix}u_i \\\\ x_i\end{bmatrix}^T
//!     \begin{bmatrix}R_i & S_i \\\\ S_i^T & Q_i\end{bmatrix}
//!     \begin{bmatrix}u_i \\\\ x_i\end{bmatrix} + r_i^T u_i + q_i^T x_i \\\\\[2ex\]
//! \text{subject to} & x_{i+1} = A_i x_i + B_i u_i + b_i \\\\\[1ex\]
//!     & \underline{b}_i \le [u_i; x_i]_{\mathcal{I}_i} \le \overline{b}_i \\\\\[1ex\]
//!     & \underline{g}_i \le C_i x_i + D_i u_i \le \overline{g}_i
//! \end{array}
//! $$
//!
//! with optional soft constraints on any bound or general inequality.
//!
//! ## Features
//!
//! * __Arena layout__: [`OcpQp`](ocp_qp::OcpQp) places the data of every
//!   stage in one cache aligned memory block, sized exactly from the
//!   problem dimensions by [`memsize`](ocp_qp::memsize) before allocation.
//!   Field accessors copy data in and out from column or row major arrays.
//!
//! * __KKT residuals__: [`compute_ocp_residuals`](residuals::compute_ocp_residuals)
//!   and [`compute_dense_residuals`](residuals::compute_dense_residuals)
//!   evaluate stationarity, equality, slack consistency and complementarity
//!   residuals at an iterate, without allocating.
//!
//! The Newton step computation and the interior point loop itself live
//! outside this crate.

pub mod algebra;
pub mod dense_qp;
pub mod ocp_qp;
pub mod residuals;

pub use ocp_qp::{memsize, OcpQp, OcpQpDim, OcpQpField, QpError};
pub use residuals::{
    compute_dense_residuals, compute_ocp_residuals, ResidualNorms, ResidualTolerances,
};
