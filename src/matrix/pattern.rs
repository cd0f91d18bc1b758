use crate::matrix::Dim;
use crate::matrix::error::PatternError;

/// Logical compressed sparse column matrix: only the support is stored, and
/// every stored entry is implicitly true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    pub dim: Dim,
    /// Column pointers, len = ncols + 1
    pub column_pointers: Vec<usize>,
    /// Row indices, len = nnz, strictly ascending within each column
    pub row_indices: Vec<usize>,
}

impl SparsityPattern {
    /// number of stored entries
    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    /// Row indices of column j
    pub fn col(&self, j: usize) -> &[usize] {
        let (s, e) = (self.column_pointers[j], self.column_pointers[j + 1]);
        &self.row_indices[s..e]
    }

    /// True if (row, col) is part of the pattern
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.col(col).binary_search(&row).is_ok()
    }

    pub fn check_invariants(&self) -> Result<(), PatternError> {
        if self.column_pointers.len() != self.dim.ncols + 1 {
            return Err(PatternError::InvalidColumnPointersLength {
                expected: self.dim.ncols + 1,
                actual: self.column_pointers.len(),
            });
        }
        if *self.column_pointers.first().unwrap_or(&1) != 0 {
            return Err(PatternError::InvalidColumnPointers {
                index: 0,
                expected: 0,
                actual: *self.column_pointers.first().unwrap_or(&1),
            });
        }
        if *self.column_pointers.last().unwrap() != self.nnz() {
            return Err(PatternError::InvalidColumnPointers {
                index: self.dim.ncols,
                expected: self.nnz(),
                actual: *self.column_pointers.last().unwrap(),
            });
        }
        // per-column sorted & in-range
        for j in 0..self.dim.ncols {
            let (start, end) = (self.column_pointers[j], self.column_pointers[j + 1]);
            if start > end || end > self.nnz() {
                return Err(PatternError::InvalidColumnPointers {
                    index: j,
                    expected: start,
                    actual: end,
                });
            }
            let mut prev = None;
            for &r in &self.row_indices[start..end] {
                if r >= self.dim.nrows {
                    return Err(PatternError::OutOfBoundsIndex {
                        index: r,
                        max: self.dim.nrows,
                    });
                }
                if let Some(p) = prev {
                    if r <= p {
                        return Err(PatternError::RowsNotStrictlyIncreasing {
                            index: j,
                            expected: p,
                            actual: r,
                        });
                    }
                }
                prev = Some(r);
            }
        }
        Ok(())
    }
}
