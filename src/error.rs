use thiserror::Error;

use crate::matrix::error::MatrixError;
use crate::skeleton::error::SkeletonError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Skeleton(#[from] SkeletonError),
}
