//! Greedy construction of the interpolation-operator support.
//!
//! For each coarse column the solver expands a small set of fine rows by a
//! sparse A-orthogonal (conjugate) descent on f = 1/2 x^t A x - b^t x,
//! stopping as soon as every further nonzero would be negligible under the
//! configured rule.

mod basis;
mod column;
pub mod error;
mod heap;
mod interp;
mod spvec;

pub use error::{SkeletonError, SkeletonResult};
pub use interp::interp_skel;

use crate::matrix::pattern::SparsityPattern;

/// Stopping rule for a column's greedy expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRule {
    /// stop when any nonzero that would be set would be less than tol^2/2
    MaxEntry,
    /// stop when the sum, over all possible nonzeros, of the value they
    /// would be set to, is less than tol/2
    SumEntries,
}

#[derive(Debug, Clone, Copy)]
pub struct SkeletonConfig {
    pub stop: StopRule,
    /// initial guess: no column will have more nonzeros than this; the
    /// basis storage doubles when exceeded
    pub initial_basis_columns: usize,
    // how to handle a pivot whose denominator D[s] - beta[s] is not
    // positive (the operator is not positive definite on the selected
    // support):
    // FALSE: keep going. The reciprocal square root produces NaN or
    //   infinity, which then propagates through the column's results.
    // TRUE: stop quickly and return an error for the whole call. This is
    //   the default.
    pub halt_if_indefinite: bool,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            stop: StopRule::SumEntries,
            initial_basis_columns: 35,
            halt_if_indefinite: true,
        }
    }
}

impl SkeletonConfig {
    pub(crate) fn validated(&self) -> Self {
        let mut config = *self;
        config.initial_basis_columns = config.initial_basis_columns.max(1);
        config
    }
}

/// Result of [`interp_skel`]: the support of the interpolation operator X
/// and its weighted row sum.
#[derive(Debug, Clone)]
pub struct Interpolation {
    /// sparsity pattern of X, one column per coarse unknown, row indices
    /// strictly ascending within each column
    pub skeleton: SparsityPattern,
    /// X * u
    pub row_sum: Vec<f64>,
}
