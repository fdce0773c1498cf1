//! Application-level errors (wraps domain and remote errors)

use std::time::Duration;

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::ApiError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Remote(#[from] ApiError),

    #[error("gave up waiting for task [ {task_id} ] after {}s", waited.as_secs())]
    TaskTimeout { task_id: String, waited: Duration },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
