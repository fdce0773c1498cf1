//! Command-line client for systems registered with a Katello server.
//!
//! Layers, innermost first:
//! - [`domain`]: typed server records and validated user intent
//! - [`application`]: services that resolve names, drive remote tasks and wrap errors
//! - [`infrastructure`]: the HTTP adapter, I/O seams and the service container
//! - [`cli`]: clap definitions, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
