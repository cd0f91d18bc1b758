pub mod csc;
pub mod error;
pub mod mtx;
pub mod pattern;

/// Matrix dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dim {
    pub nrows: usize,
    pub ncols: usize,
}
