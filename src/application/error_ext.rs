//! Error conversion helpers for remote calls and local file writes

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::DomainError;
use crate::infrastructure::ApiResult;

/// Extension trait for giving a remote not-found a user-facing meaning.
pub trait ApiResultExt<T> {
    /// Replace `ApiError::NotFound` with the given domain error; other errors pass through unchanged.
    ///
    /// # Example
    /// ```ignore
    /// api.system(uuid)
    ///     .or_not_found(|| DomainError::SystemNotFound { reference, org })?;
    /// ```
    fn or_not_found(self, err: impl FnOnce() -> DomainError) -> ApplicationResult<T>;
}

impl<T> ApiResultExt<T> for ApiResult<T> {
    fn or_not_found(self, err: impl FnOnce() -> DomainError) -> ApplicationResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) if e.is_not_found() => Err(ApplicationError::Domain(err())),
            Err(e) => Err(ApplicationError::Remote(e)),
        }
    }
}

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}
