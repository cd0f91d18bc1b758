//! Sparse-vector kernels for the column solver: a masked sparse
//! matrix-vector product and the merged residual/energy update.

use crate::matrix::csc::CscMatrix;

use super::heap::{sift_down, sift_up};

/// Sparse matrix times sparse vector, y := A * x.
///
/// `x` is given as parallel index/value slices and may have unsorted
/// indices; `y` is emitted with strictly ascending indices and the return
/// value is nnz(y). Rows with `mask[i] >= 0` are suppressed.
///
/// A dense image of y is accumulated in `sv` while every newly touched row
/// goes into a max-heap built inside `yi`; `flag` records membership so the
/// heap holds no duplicates. Draining the heap by delete-max from the back
/// leaves `yi` ascending, and clearing `flag` as values are copied out
/// restores the workspace.
///
/// `sv` and `flag` must have length `a.dim.nrows`; `flag` must be all false
/// on entry and is all false again on exit.
pub(crate) fn masked_spmv(
    a: &CscMatrix,
    xi: &[usize],
    xv: &[f64],
    mask: &[isize],
    yi: &mut [usize],
    yv: &mut [f64],
    sv: &mut [f64],
    flag: &mut [bool],
) -> usize {
    let mut yn = 0;
    for (&j, &xj) in xi.iter().zip(xv.iter()) {
        if xj == 0.0 {
            continue;
        }
        for p in a.col_start(j)..a.col_end(j) {
            let i = a.row_index(p);
            if mask[i] >= 0 {
                continue;
            }
            if !flag[i] {
                sift_up(yi, yn, i);
                yn += 1;
                flag[i] = true;
                sv[i] = 0.0;
            }
            sv[i] += a.value(p) * xj;
        }
    }
    for end in (1..yn).rev() {
        let i = yi[end];
        yi[end] = yi[0];
        sift_down(&mut yi[..end], i);
    }
    for p in 0..yn {
        yv[p] = sv[yi[p]];
        flag[yi[p]] = false;
    }
    yn
}

/// Streaming merge of two index-ascending sparse vectors:
///
///   r := (x - alpha * y) restricted to rows where mask[i] < 0,
///   beta[i] += y_i^2 where x is defined at i,
///   beta[i] := y_i^2 where only y touches i (beta was undefined there).
///
/// beta writes are not masked. `r` is emitted with strictly ascending
/// indices; the return value is nnz(r).
#[allow(clippy::too_many_arguments)]
pub(crate) fn residual_update(
    xi: &[usize],
    xv: &[f64],
    alpha: f64,
    yi: &[usize],
    yv: &[f64],
    mask: &[isize],
    ri: &mut [usize],
    rv: &mut [f64],
    beta: &mut [f64],
) -> usize {
    let (xn, yn) = (xi.len(), yi.len());
    let (mut px, mut py) = (0, 0);
    let mut rnz = 0;
    if px < xn && py < yn {
        let mut ix = xi[0];
        let mut iy = yi[0];
        loop {
            if ix < iy {
                if mask[ix] < 0 {
                    ri[rnz] = ix;
                    rv[rnz] = xv[px];
                    rnz += 1;
                }
                px += 1;
                if px == xn {
                    break;
                }
                ix = xi[px];
            } else if ix > iy {
                let y = yv[py];
                beta[iy] = y * y;
                if mask[iy] < 0 {
                    ri[rnz] = iy;
                    rv[rnz] = -alpha * y;
                    rnz += 1;
                }
                py += 1;
                if py == yn {
                    break;
                }
                iy = yi[py];
            } else {
                let y = yv[py];
                beta[iy] += y * y;
                if mask[iy] < 0 {
                    ri[rnz] = iy;
                    rv[rnz] = xv[px] - alpha * y;
                    rnz += 1;
                }
                px += 1;
                py += 1;
                if px == xn || py == yn {
                    break;
                }
                ix = xi[px];
                iy = yi[py];
            }
        }
    }
    while px < xn {
        let ix = xi[px];
        if mask[ix] < 0 {
            ri[rnz] = ix;
            rv[rnz] = xv[px];
            rnz += 1;
        }
        px += 1;
    }
    while py < yn {
        let iy = yi[py];
        let y = yv[py];
        beta[iy] = y * y;
        if mask[iy] < 0 {
            ri[rnz] = iy;
            rv[rnz] = -alpha * y;
            rnz += 1;
        }
        py += 1;
    }
    rnz
}
