//! Driver: validates the inputs, folds the stopping rule into the
//! tolerance, and runs the greedy expansion over every coarse column.

use log::{debug, trace};

use crate::matrix::Dim;
use crate::matrix::csc::CscMatrix;
use crate::matrix::pattern::SparsityPattern;

use super::column::{ColumnWorkspace, expand_column};
use super::error::{SkeletonError, SkeletonResult};
use super::{Interpolation, SkeletonConfig, StopRule};

/// Column-wise support of the sparse minimizer X of
/// f = 1/2 X^t A X - B^t X.
///
/// `a` is the fine-grid operator (symmetric positive definite), `diag` its
/// diagonal, `b` holds one target column per coarse unknown, `weights` the
/// dense column weights u, and `tol` the tolerance controlling skeleton
/// size. Produces the sparsity pattern of X together with the row sum
/// X * u; X itself is never formed.
pub fn interp_skel(
    a: &CscMatrix,
    b: &CscMatrix,
    diag: &[f64],
    weights: &[f64],
    tol: f64,
    config: &SkeletonConfig,
) -> SkeletonResult<Interpolation> {
    if !a.is_square() {
        return Err(SkeletonError::NonSquare {
            nrows: a.dim.nrows,
            ncols: a.dim.ncols,
        });
    }
    if a.dim.nrows != b.dim.nrows {
        return Err(SkeletonError::RowMismatch {
            a_rows: a.dim.nrows,
            b_rows: b.dim.nrows,
        });
    }
    if diag.len() != a.dim.nrows {
        return Err(SkeletonError::DiagonalLengthMismatch {
            expected: a.dim.nrows,
            actual: diag.len(),
        });
    }
    if weights.len() != b.dim.ncols {
        return Err(SkeletonError::WeightLengthMismatch {
            expected: b.dim.ncols,
            actual: weights.len(),
        });
    }
    if !tol.is_finite() || tol <= 0.0 {
        return Err(SkeletonError::InvalidTolerance(tol));
    }
    let config = config.validated();

    let nf = b.dim.nrows;
    let nc = b.dim.ncols;

    // fold the "/2" (and the squaring for the max rule) into the tolerance
    // once, so the inner loop compares norm > tol directly
    let tol = match config.stop {
        StopRule::MaxEntry => 0.5 * tol * tol,
        StopRule::SumEntries => 0.5 * tol,
    };

    debug!(
        "interp_skel: {nf} fine rows, {nc} coarse columns, nnz(B) = {}",
        b.nnz()
    );

    let mut ws = ColumnWorkspace::new(nf, &config);
    let mut column_pointers = Vec::with_capacity(nc + 1);
    // initial guess: nnz(X_skel) = 2 nnz(B)
    let mut row_indices: Vec<usize> = Vec::with_capacity(2 * b.nnz());
    let mut row_sum = vec![0.0; nf];

    column_pointers.push(0);
    for j in 0..nc {
        expand_column(
            a,
            b,
            j,
            diag,
            weights[j],
            tol,
            &config,
            &mut ws,
            &mut row_indices,
            &mut row_sum,
        )?;
        trace!(
            "column {j}: {} rows",
            row_indices.len() - column_pointers.last().unwrap()
        );
        column_pointers.push(row_indices.len());
        debug_assert!(ws.is_clean());
    }

    let skeleton = SparsityPattern {
        dim: Dim {
            nrows: nf,
            ncols: nc,
        },
        column_pointers,
        row_indices,
    };
    debug_assert!(skeleton.check_invariants().is_ok());
    debug!("interp_skel: nnz(X_skel) = {}", skeleton.nnz());

    Ok(Interpolation { skeleton, row_sum })
}
