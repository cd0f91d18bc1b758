//! Greedy A-orthogonal expansion of a single coarse column.

use crate::matrix::csc::CscMatrix;

use super::basis::{self, PackedBasis};
use super::error::{SkeletonError, SkeletonResult};
use super::heap::sort_ascending;
use super::spvec::{masked_spmv, residual_update};
use super::{SkeletonConfig, StopRule};

/// Row has no position in the current column's pivot list.
pub(crate) const EMPTY: isize = -1;

/// Per-call scratch state, allocated once and reused column to column.
pub(crate) struct ColumnWorkspace {
    /// beta[i] accumulates sum_k (A q_k)_i^2; only defined where the
    /// residual has ever been nonzero
    beta: Vec<f64>,
    /// dense accumulator for [`masked_spmv`]
    sv: Vec<f64>,
    /// membership marker for [`masked_spmv`]; all false outside that call
    flag: Vec<bool>,
    /// position of row i in the current column's pivot list, EMPTY where
    /// not a pivot; doubles as the mask excluding pivot rows from sparse
    /// products
    map_to_pivot: Vec<isize>,
    /// residual r = (I - A Q Q^t) B e_j
    r_ix: Vec<usize>,
    r_val: Vec<f64>,
    /// the sparse product A q_k
    aq_ix: Vec<usize>,
    aq_val: Vec<f64>,
    /// sparse scratch; the value half doubles as a dense scratch for the
    /// triangular products
    s_ix: Vec<usize>,
    s_val: Vec<f64>,
    basis: PackedBasis,
}

impl ColumnWorkspace {
    pub fn new(nrows: usize, config: &SkeletonConfig) -> Self {
        Self {
            beta: vec![0.0; nrows],
            sv: vec![0.0; nrows],
            flag: vec![false; nrows],
            map_to_pivot: vec![EMPTY; nrows],
            r_ix: vec![0; nrows],
            r_val: vec![0.0; nrows],
            aq_ix: vec![0; nrows],
            aq_val: vec![0.0; nrows],
            s_ix: vec![0; nrows],
            s_val: vec![0.0; nrows],
            basis: PackedBasis::with_capacity(config.initial_basis_columns),
        }
    }

    /// The per-column invariant: no pivot marks and no membership flags
    /// survive a finished column.
    pub fn is_clean(&self) -> bool {
        self.flag.iter().all(|&f| !f) && self.map_to_pivot.iter().all(|&m| m == EMPTY)
    }
}

fn accumulate_norm(stop: StopRule, norm: f64, term: f64) -> f64 {
    match stop {
        StopRule::MaxEntry => {
            if term > norm {
                term
            } else {
                norm
            }
        }
        StopRule::SumEntries => norm + term,
    }
}

/// Compute basis column k for pivot row s: gather A e_s on the pivot set,
/// subtract its projection Q Q^t A e_s, and scale so that q_k^t A q_k = 1.
/// `denom` is the pivot's Schur complement D[s] - beta[s].
fn orthogonalize_pivot(
    a: &CscMatrix,
    s: usize,
    k: usize,
    denom: f64,
    map_to_pivot: &[isize],
    basis: &mut PackedBasis,
    scratch: &mut [f64],
) {
    let (prev, qk) = basis.split_column(k);
    let (rows, vals) = a.col(s);
    basis::restrict_to_pivots(map_to_pivot, rows, vals, qk);
    basis::mult_transpose(prev, k, qk, &mut scratch[..k]);
    basis::mult(prev, k, &scratch[..k], qk);
    let norm_fac = -1.0 / denom.sqrt();
    for q in qk[..k].iter_mut() {
        *q *= norm_fac;
    }
    qk[k] = -norm_fac;
}

/// Greedy expansion for coarse column j with target b = B e_j.
///
/// Appends the column's pivot rows (ascending) to `rows` and accumulates
/// u_j * X e_j into `row_sum`. Ties in the pivot score resolve to the entry
/// scanned first, i.e. the one appearing earlier in the residual's index
/// list.
#[allow(clippy::too_many_arguments)]
pub(crate) fn expand_column(
    a: &CscMatrix,
    b: &CscMatrix,
    j: usize,
    diag: &[f64],
    u_j: f64,
    tol: f64,
    config: &SkeletonConfig,
    ws: &mut ColumnWorkspace,
    rows: &mut Vec<usize>,
    row_sum: &mut [f64],
) -> SkeletonResult<()> {
    let col_start = rows.len();

    // initial residual = B e_j
    let (bi, bv) = b.col(j);
    let mut rnz = bi.len();
    if rnz == 0 {
        return Ok(());
    }
    ws.r_ix[..rnz].copy_from_slice(bi);
    ws.r_val[..rnz].copy_from_slice(bv);

    // initialize beta on the residual support while scanning for the first
    // pivot s and the stopping norm
    let mut s = ws.r_ix[0];
    ws.beta[s] = 0.0;
    let mut w = ws.r_val[0] / diag[s].sqrt();
    let mut norm = (ws.r_val[0] / diag[s]).abs();
    for p in 1..rnz {
        let i = ws.r_ix[p];
        let r = ws.r_val[p];
        let d = diag[i];
        ws.beta[i] = 0.0;
        let tw = r / d.sqrt();
        let tn = (r / d).abs();
        if tw.abs() > w.abs() {
            w = tw;
            s = i;
        }
        norm = accumulate_norm(config.stop, norm, tn);
    }

    let mut k = 0;
    while norm > tol {
        ws.basis.ensure_column(k);

        // record the new nonzero and its position in the pivot list
        rows.push(s);
        ws.map_to_pivot[s] = k as isize;

        let denom = diag[s] - ws.beta[s];
        if config.halt_if_indefinite && denom <= 0.0 {
            return Err(SkeletonError::IndefinitePivot {
                row: s,
                value: denom,
            });
        }

        // q_k := (D[s] - beta[s])^{-1/2} (I - Q Q^t A) e_s
        orthogonalize_pivot(a, s, k, denom, &ws.map_to_pivot, &mut ws.basis, &mut ws.s_val);

        // X e_j += w Q e_k, so X_sum += u_j w Q e_k
        let pivots = &rows[col_start..];
        let qk = ws.basis.column(k);
        let ujw = u_j * w;
        for (m, &i) in pivots.iter().enumerate() {
            row_sum[i] += ujw * qk[m];
        }

        // A q_k, masked so every current pivot row reads zero: for the
        // previous pivots that is the A-orthogonality of the new direction,
        // and the artificial zero at s is harmless because r_s = 0 there
        // already
        let aq_nz = masked_spmv(
            a,
            pivots,
            qk,
            &ws.map_to_pivot,
            &mut ws.aq_ix,
            &mut ws.aq_val,
            &mut ws.sv,
            &mut ws.flag,
        );

        // r := r - w A q_k, beta := beta + (A q_k).^2
        ws.s_ix[..rnz].copy_from_slice(&ws.r_ix[..rnz]);
        ws.s_val[..rnz].copy_from_slice(&ws.r_val[..rnz]);
        rnz = residual_update(
            &ws.s_ix[..rnz],
            &ws.s_val[..rnz],
            w,
            &ws.aq_ix[..aq_nz],
            &ws.aq_val[..aq_nz],
            &ws.map_to_pivot,
            &mut ws.r_ix,
            &mut ws.r_val,
            &mut ws.beta,
        );

        // rescan the residual for the next pivot and the stopping norm
        if rnz > 0 {
            s = ws.r_ix[0];
            let d = diag[s] - ws.beta[s];
            w = ws.r_val[0] / d.sqrt();
            norm = (ws.r_val[0] / d).abs();
            for p in 1..rnz {
                let i = ws.r_ix[p];
                let r = ws.r_val[p];
                let d = diag[i] - ws.beta[i];
                let tw = r / d.sqrt();
                let tn = (r / d).abs();
                if tw.abs() > w.abs() {
                    w = tw;
                    s = i;
                }
                norm = accumulate_norm(config.stop, norm, tn);
            }
        } else {
            norm = 0.0;
        }
        k += 1;
    }

    // ascending row indices within the column, then restore the map
    sort_ascending(&mut rows[col_start..]);
    for &i in rows[col_start..].iter() {
        ws.map_to_pivot[i] = EMPTY;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::csc::CscBuilder;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn tridiag(n: usize) -> CscMatrix {
        let mut b = CscBuilder::new(n, n);
        for j in 0..n {
            if j > 0 {
                b.push(j, j - 1, -1.0).unwrap();
            }
            b.push(j, j, 2.0).unwrap();
            if j + 1 < n {
                b.push(j, j + 1, -1.0).unwrap();
            }
        }
        b.build().unwrap()
    }

    fn single_column(n: usize, entries: &[(usize, f64)]) -> CscMatrix {
        let mut b = CscBuilder::new(n, 1);
        for &(i, v) in entries {
            b.push(0, i, v).unwrap();
        }
        b.build().unwrap()
    }

    fn run_column(
        a: &CscMatrix,
        b: &CscMatrix,
        tol: f64,
        config: &SkeletonConfig,
    ) -> (ColumnWorkspace, Vec<usize>, Vec<f64>) {
        let n = a.dim.nrows;
        let diag = a.diagonal();
        let mut ws = ColumnWorkspace::new(n, config);
        let mut rows = Vec::new();
        let mut row_sum = vec![0.0; n];
        expand_column(a, b, 0, &diag, 1.0, tol, config, &mut ws, &mut rows, &mut row_sum)
            .unwrap();
        (ws, rows, row_sum)
    }

    #[test]
    fn workspace_is_clean_after_each_column() {
        let a = tridiag(8);
        let b = single_column(8, &[(0, 1.0), (4, -2.0)]);
        let config = SkeletonConfig::default();
        let (ws, rows, _) = run_column(&a, &b, 0.5 * 1e-8, &config);
        assert!(!rows.is_empty());
        assert!(ws.is_clean());
    }

    #[test]
    fn full_expansion_visits_every_row_once() {
        let a = tridiag(8);
        let b = single_column(8, &[(0, 1.0)]);
        let config = SkeletonConfig::default();
        // adjusted tolerance small enough to force the whole grid in
        let (ws, rows, _) = run_column(&a, &b, 0.5 * 1e-10, &config);
        assert_eq!(rows, (0..8).collect::<Vec<_>>());
        assert!(ws.is_clean());
    }

    #[test]
    fn tie_breaks_to_first_scanned_entry() {
        // identity operator, two target entries with equal score
        let mut builder = CscBuilder::new(2, 2);
        builder.push(0, 0, 1.0).unwrap();
        builder.push(1, 1, 1.0).unwrap();
        let a = builder.build().unwrap();
        let b = single_column(2, &[(0, 1.0), (1, 1.0)]);
        let config = SkeletonConfig::default();
        // sum norm starts at 2, drops to 1 after the first pivot; a
        // threshold of 1.5 stops right there
        let (_, rows, row_sum) = run_column(&a, &b, 1.5, &config);
        assert_eq!(rows, vec![0]);
        assert_eq!(row_sum, vec![1.0, 0.0]);
    }

    #[test]
    fn indefinite_pivot_is_reported() {
        // [ 1 2 ; 2 1 ] is indefinite; the second pivot's denominator goes
        // negative
        let mut builder = CscBuilder::new(2, 2);
        builder.push(0, 0, 1.0).unwrap();
        builder.push(0, 1, 2.0).unwrap();
        builder.push(1, 0, 2.0).unwrap();
        builder.push(1, 1, 1.0).unwrap();
        let a = builder.build().unwrap();
        let b = single_column(2, &[(0, 1.0), (1, 1.0)]);
        let config = SkeletonConfig::default();

        let diag = a.diagonal();
        let mut ws = ColumnWorkspace::new(2, &config);
        let mut rows = Vec::new();
        let mut row_sum = vec![0.0; 2];
        let err = expand_column(
            &a, &b, 0, &diag, 1.0, 0.05, &config, &mut ws, &mut rows, &mut row_sum,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SkeletonError::IndefinitePivot { row: 1, value } if value < 0.0
        ));
    }

    #[test]
    fn indefinite_pivot_propagates_nan_when_not_halting() {
        let mut builder = CscBuilder::new(2, 2);
        builder.push(0, 0, 1.0).unwrap();
        builder.push(0, 1, 2.0).unwrap();
        builder.push(1, 0, 2.0).unwrap();
        builder.push(1, 1, 1.0).unwrap();
        let a = builder.build().unwrap();
        let b = single_column(2, &[(0, 1.0), (1, 1.0)]);
        let config = SkeletonConfig {
            halt_if_indefinite: false,
            ..Default::default()
        };
        let (ws, rows, row_sum) = run_column(&a, &b, 0.05, &config);
        assert_eq!(rows, vec![0, 1]);
        assert!(row_sum[1].is_nan());
        assert!(ws.is_clean());
    }

    /// Drive the basis construction directly over a fixed pivot sequence and
    /// check Q^t A Q = I in dense arithmetic.
    #[test]
    fn basis_is_a_orthonormal() {
        let a = tridiag(4);
        let a_dense = a.to_dense();
        let pivots = [2usize, 0, 3, 1];

        let config = SkeletonConfig::default();
        let mut basis = PackedBasis::with_capacity(config.initial_basis_columns);
        let mut map = vec![EMPTY; 4];
        let mut scratch = vec![0.0; 4];
        let mut gathered = vec![0.0; 4];
        let mut tq = vec![0.0; 4];

        for (k, &s) in pivots.iter().enumerate() {
            map[s] = k as isize;
            // denom = A[s,s] - || Q^t A e_s ||^2, the Schur complement of A
            // on the pivot support
            let (rows, vals) = a.col(s);
            basis::restrict_to_pivots(&map, rows, vals, &mut gathered[..k + 1]);
            let (prev, _) = basis.split_column(k);
            basis::mult_transpose(prev, k, &gathered[..k + 1], &mut tq[..k]);
            let denom = a_dense[[s, s]] - tq[..k].iter().map(|t| t * t).sum::<f64>();
            orthogonalize_pivot(&a, s, k, denom, &map, &mut basis, &mut scratch);
        }

        // expand packed Q into row coordinates
        let mut q_dense = Array2::<f64>::zeros((4, 4));
        for c in 0..4 {
            let col = basis.column(c);
            for (r, &v) in col.iter().enumerate() {
                q_dense[[pivots[r], c]] = v;
            }
        }
        let gram = q_dense.t().dot(&a_dense).dot(&q_dense);
        for i in 0..4 {
            for j in 0..4 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expect, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn basis_growth_mid_column_is_safe() {
        let a = tridiag(16);
        let b = single_column(16, &[(0, 1.0)]);
        let config = SkeletonConfig {
            initial_basis_columns: 2,
            ..Default::default()
        };
        let (ws, rows, row_sum) = run_column(&a, &b, 0.5 * 1e-10, &config);
        assert_eq!(rows, (0..16).collect::<Vec<_>>());
        assert!(ws.is_clean());
        // fully expanded, the accumulated column solves A x = e_0
        let n = 16.0;
        for (i, &v) in row_sum.iter().enumerate() {
            let expect = (n - i as f64) / (n + 1.0);
            assert_abs_diff_eq!(v, expect, epsilon = 1e-10);
        }
    }
}
