//! Domain layer: typed records and validated user intent
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod reference;
pub mod report;

pub use entities::*;
pub use error::DomainError;
pub use reference::{clean_list, PackageAction, PackageOptions, SystemRef, UnsubscribeTarget};
pub use report::{attachment_file_name, ReportFormat, DEFAULT_PDF_NAME};
