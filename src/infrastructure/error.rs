//! Infrastructure-level errors
//!
//! `ApiError` is what the `ServerApi` boundary reports; `InfraError` wraps
//! application errors and adds local I/O concerns.

use thiserror::Error;

use crate::application::ApplicationError;

/// Failure reported by the remote API boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{resource} not found: {message}")]
    NotFound { resource: String, message: String },

    #[error("server returned {status} for {resource}: {message}")]
    Status {
        status: u16,
        resource: String,
        message: String,
    },

    #[error("request to {resource} failed: {message}")]
    Transport { resource: String, message: String },

    #[error("unexpected response from {resource}: {message}")]
    Decode { resource: String, message: String },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            message: "not found".into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type returned by `ServerApi` implementations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http client setup failed: {message}")]
    HttpClient { message: String },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<ApiError> for InfraError {
    fn from(e: ApiError) -> Self {
        Self::Application(ApplicationError::Remote(e))
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
