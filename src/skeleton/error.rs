use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkeletonError {
    // --- Input validation ---
    #[error("operator matrix must be square (nrows={nrows}, ncols={ncols})")]
    NonSquare { nrows: usize, ncols: usize },

    #[error("rows(A) != rows(B) (rows(A)={a_rows}, rows(B)={b_rows})")]
    RowMismatch { a_rows: usize, b_rows: usize },

    #[error("diagonal length mismatch: expected {expected}, got {actual}")]
    DiagonalLengthMismatch { expected: usize, actual: usize },

    #[error("column weight length mismatch: expected {expected}, got {actual}")]
    WeightLengthMismatch { expected: usize, actual: usize },

    #[error("tolerance must be a positive finite scalar, got {0}")]
    InvalidTolerance(f64),

    // --- Numerical degeneracy ---
    #[error(
        "pivot denominator not positive at row {row} (D[s] - beta[s] = {value:e}); \
         operator is not positive definite on the selected support"
    )]
    IndefinitePivot { row: usize, value: f64 },
}

pub type SkeletonResult<T> = Result<T, SkeletonError>;
