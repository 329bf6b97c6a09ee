//! Structured multi-stage QP held in a single cache aligned memory block.
//!
//! Binding follows a two phase protocol: [`memsize`] (or
//! [`OcpQp::memsize`]) reports the bytes required for a set of
//! [`OcpQpDim`] dimensions, and [`OcpQp::from_memory`] partitions a block of
//! at least that size according to an [`OcpQpLayout`].  Data is then
//! moved in and out by named [`OcpQpField`]s, or loaded for every stage
//! at once from [`OcpQpStageData`].

mod dim;
mod error;
mod fields;
mod layout;
mod qp;
mod stage_data;

pub use dim::*;
pub use error::*;
pub use fields::*;
pub use layout::*;
pub use qp::*;
pub use stage_data::*;
