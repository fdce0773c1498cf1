//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::SystemRef;

/// Domain errors represent lookups and references that cannot be satisfied.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("either a system name or a system uuid is required")]
    MissingSystemRef,

    #[error("system name [ {name} ] and uuid [ {uuid} ] are mutually exclusive")]
    ConflictingSystemRef { name: String, uuid: String },

    #[error("could not find system [ {reference} ] in org [ {org} ]")]
    SystemNotFound { reference: SystemRef, org: String },

    #[error("found {count} systems matching [ {reference} ] in org [ {org} ], use --uuid to pick one")]
    AmbiguousSystem {
        reference: SystemRef,
        org: String,
        count: usize,
    },

    #[error("could not find environment [ {name} ] in org [ {org} ]")]
    EnvironmentNotFound { name: String, org: String },

    #[error("could not find system groups [ {names} ] in org [ {org} ]")]
    SystemGroupNotFound { names: String, org: String },

    #[error("could not {action} system [ {name} ]")]
    RecordRejected { action: &'static str, name: String },

    #[error("at most one package action may be given per call")]
    ConflictingPackageActions,

    #[error("--all updates every package and takes no package names")]
    UpdateAllWithNames,

    #[error("empty package list for {action}")]
    EmptyPackageList { action: &'static str },

    #[error("unknown report format: {0}")]
    UnknownReportFormat(String),
}
