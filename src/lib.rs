//! Interpolation-skeleton construction for algebraic multigrid.
//!
//! Given a symmetric positive-definite operator A in compressed sparse
//! column form, a target matrix B of ideal coarse-to-fine interpolation
//! directions, the diagonal of A, column weights u, and a tolerance, the
//! solver produces the sparsity pattern of the interpolation operator X and
//! the dense row sum X * u without ever materializing X's values.

pub mod error;
pub mod matrix;
pub mod skeleton;

pub use error::Error;
pub use matrix::Dim;
pub use matrix::csc::{CscBuilder, CscMatrix};
pub use matrix::pattern::SparsityPattern;
pub use skeleton::{Interpolation, SkeletonConfig, SkeletonError, StopRule, interp_skel};
