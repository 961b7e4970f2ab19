//! Convenience result type alias for DataRepo.

use crate::error::AppError;

/// A specialized `Result` type for DataRepo operations.
///
/// Every crate in the workspace returns this so callers match on a single
/// error type.
pub type AppResult<T> = Result<T, AppError>;
