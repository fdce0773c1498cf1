//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::{ApiError, InfraError};

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::HttpClient { .. } => exitcode::SOFTWARE,
                InfraError::Application(e) => application_exit_code(e),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(d) => match d {
            DomainError::MissingSystemRef
            | DomainError::ConflictingSystemRef { .. }
            | DomainError::ConflictingPackageActions
            | DomainError::UpdateAllWithNames
            | DomainError::EmptyPackageList { .. }
            | DomainError::UnknownReportFormat(_) => exitcode::USAGE,
            _ => exitcode::DATAERR,
        },
        ApplicationError::Remote(r) => match r {
            ApiError::NotFound { .. } => exitcode::DATAERR,
            ApiError::Status { status, .. } if *status == 401 || *status == 403 => {
                exitcode::NOPERM
            }
            ApiError::Status { .. } => exitcode::SOFTWARE,
            ApiError::Transport { .. } => exitcode::UNAVAILABLE,
            ApiError::Decode { .. } => exitcode::PROTOCOL,
        },
        ApplicationError::TaskTimeout { .. } => exitcode::TEMPFAIL,
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::OperationFailed { .. } => exitcode::CANTCREAT,
    }
}
