//! Convenience result type alias for Cloudio.

use crate::error::AppError;

/// A specialized `Result` type for Cloudio operations.
pub type AppResult<T> = Result<T, AppError>;
