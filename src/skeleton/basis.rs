//! Packed upper-triangular storage for the per-column A-orthonormal basis Q
//! and the small dense products applied to it.
//!
//! Column k of Q occupies the flat range `[k(k+1)/2, k(k+1)/2 + k + 1)`, so
//! entry Q[r,c] (r <= c) lives at `c(c+1)/2 + r`. The basis is triangular
//! relative to the current column's pivot sequence: column c has stored rows
//! only for pivot positions 0..=c.

use log::trace;

pub(crate) const fn offset(k: usize) -> usize {
    k * (k + 1) / 2
}

const fn packed_len(columns: usize) -> usize {
    columns * (columns + 1) / 2
}

pub(crate) struct PackedBasis {
    values: Vec<f64>,
    /// columns the buffer can hold before regrowing
    capacity: usize,
}

impl PackedBasis {
    pub fn with_capacity(columns: usize) -> Self {
        let columns = columns.max(1);
        Self {
            values: vec![0.0; packed_len(columns)],
            capacity: columns,
        }
    }

    /// Make sure column k is addressable, doubling the buffer if not.
    pub fn ensure_column(&mut self, k: usize) {
        if k + 1 > self.capacity {
            while self.capacity < k + 1 {
                self.capacity *= 2;
            }
            trace!("growing basis storage to {} columns", self.capacity);
            self.values.resize(packed_len(self.capacity), 0.0);
        }
    }

    /// Borrow columns 0..k (packed, shared) together with the writable slot
    /// for column k.
    pub fn split_column(&mut self, k: usize) -> (&[f64], &mut [f64]) {
        let (head, tail) = self.values.split_at_mut(offset(k));
        (&*head, &mut tail[..k + 1])
    }

    /// Stored entries of column k (pivot positions 0..=k).
    pub fn column(&self, k: usize) -> &[f64] {
        &self.values[offset(k)..offset(k) + k + 1]
    }
}

/// out := Q[:,0:k]^T x, where x is dense over pivot positions (only the
/// first c+1 components of x meet column c). Produces a k-length out.
pub(crate) fn mult_transpose(q: &[f64], k: usize, x: &[f64], out: &mut [f64]) {
    for c in 0..k {
        let col = &q[offset(c)..offset(c) + c + 1];
        let mut acc = 0.0;
        for (r, &qrc) in col.iter().enumerate() {
            acc += qrc * x[r];
        }
        out[c] = acc;
    }
}

/// out := Q[:,0:k] x, producing a (k+1)-length out whose last component is
/// 0 (the k-th column is not filled in yet).
pub(crate) fn mult(q: &[f64], k: usize, x: &[f64], out: &mut [f64]) {
    out[..k + 1].fill(0.0);
    for (c, &xc) in x.iter().enumerate().take(k) {
        for (r, &qrc) in q[offset(c)..offset(c) + c + 1].iter().enumerate() {
            out[r] += qrc * xc;
        }
    }
}

/// Gather a sparse column (`rows`, `vals`) onto the current pivot positions
/// given by `map_to_pivot`, into a zero-filled dense vector indexed by pivot
/// order. Rows outside the pivot set are dropped.
pub(crate) fn restrict_to_pivots(
    map_to_pivot: &[isize],
    rows: &[usize],
    vals: &[f64],
    out: &mut [f64],
) {
    out.fill(0.0);
    for (&i, &v) in rows.iter().zip(vals.iter()) {
        let q = map_to_pivot[i];
        if q >= 0 {
            out[q as usize] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Q = [ 1  2  4
    ///       .  3  5
    ///       .  .  6 ]  packed column-major
    const Q3: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

    #[test]
    fn packed_offsets() {
        assert_eq!(offset(0), 0);
        assert_eq!(offset(1), 1);
        assert_eq!(offset(2), 3);
        assert_eq!(offset(5), 15);
    }

    #[test]
    fn mult_transpose_matches_dense() {
        let x = [1.0, -1.0, 2.0, 7.0];
        let mut out = [0.0; 3];
        mult_transpose(&Q3, 3, &x, &mut out);
        // column c dotted with x[0..=c]
        assert_eq!(out, [1.0, 2.0 - 3.0, 4.0 - 5.0 + 12.0]);
    }

    #[test]
    fn mult_matches_dense_and_zeroes_last() {
        let x = [1.0, -1.0, 2.0];
        let mut out = [9.0; 4];
        mult(&Q3, 3, &x, &mut out);
        // row r summed over columns c >= r
        assert_eq!(out, [1.0 - 2.0 + 8.0, -3.0 + 10.0, 12.0, 0.0]);
    }

    #[test]
    fn mult_with_k_zero_only_zeroes() {
        let mut out = [5.0, 5.0];
        mult(&Q3, 0, &[], &mut out);
        assert_eq!(out, [0.0, 5.0]);
    }

    #[test]
    fn restrict_gathers_by_pivot_position() {
        // rows 4 and 1 are pivots 0 and 2, row 3 is not a pivot
        let map = [-1isize, 2, -1, -1, 0];
        let rows = [1usize, 3, 4];
        let vals = [10.0, 20.0, 30.0];
        let mut out = [7.0, 7.0, 7.0];
        restrict_to_pivots(&map, &rows, &vals, &mut out);
        assert_eq!(out, [30.0, 0.0, 10.0]);
    }

    #[test]
    fn growth_preserves_written_columns() {
        let mut basis = PackedBasis::with_capacity(1);
        {
            let (prev, qk) = basis.split_column(0);
            assert!(prev.is_empty());
            qk[0] = 42.0;
        }
        basis.ensure_column(3);
        assert_eq!(basis.column(0), &[42.0]);
        {
            let (prev, qk) = basis.split_column(3);
            assert_eq!(prev.len(), offset(3));
            assert_eq!(qk.len(), 4);
        }
    }
}
