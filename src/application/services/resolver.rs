//! Name → identifier resolution
//!
//! Every command that targets a system goes through here first, so an
//! absent or ambiguous name fails before anything is changed on the server.

use std::sync::Arc;

use tracing::debug;

use crate::application::error_ext::ApiResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, Environment, System, SystemQuery, SystemRef};
use crate::infrastructure::traits::ServerApi;

/// Name shown for the implicit environment.
pub const LIBRARY: &str = "Library";

/// Resolves user-supplied names to server records.
pub struct SystemResolver {
    api: Arc<dyn ServerApi>,
}

impl SystemResolver {
    pub fn new(api: Arc<dyn ServerApi>) -> Self {
        Self { api }
    }

    /// Look up an environment by name; `None` selects the library environment.
    pub fn environment(&self, org: &str, name: Option<&str>) -> ApplicationResult<Environment> {
        let not_found = || DomainError::EnvironmentNotFound {
            name: name.unwrap_or(LIBRARY).to_string(),
            org: org.to_string(),
        };
        let environments = self.api.environments(org, name).or_not_found(not_found)?;
        debug!(
            "environment lookup {:?} in {}: {} match(es)",
            name,
            org,
            environments.len()
        );
        environments
            .into_iter()
            .next()
            .ok_or_else(|| ApplicationError::Domain(not_found()))
    }

    /// Resolve a reference to the full system record.
    ///
    /// A uuid is fetched directly. A name is searched in the org, or in
    /// `environment` when given, and must match exactly one system.
    pub fn system(
        &self,
        org: &str,
        reference: &SystemRef,
        environment: Option<&str>,
    ) -> ApplicationResult<System> {
        match reference {
            SystemRef::Uuid(uuid) => self
                .api
                .system(uuid)
                .or_not_found(|| not_found(reference, org)),
            SystemRef::Name(name) => {
                let query = SystemQuery {
                    name: Some(name.clone()),
                    ..Default::default()
                };
                let matches = match environment {
                    Some(env_name) => {
                        let env = self.environment(org, Some(env_name))?;
                        self.api.systems_by_env(env.id, &query)
                    }
                    None => self.api.systems_by_org(org, &query),
                }
                .or_not_found(|| not_found(reference, org))?;
                let summary = exactly_one(matches, reference, org)?;
                self.api
                    .system(&summary.uuid)
                    .or_not_found(|| not_found(reference, org))
            }
        }
    }

    /// Resolve through the org listing only, filtering by name or uuid.
    ///
    /// Used where the listing record is enough (group membership).
    pub fn system_in_org(&self, org: &str, reference: &SystemRef) -> ApplicationResult<System> {
        let query = SystemQuery {
            name: reference.name().map(str::to_string),
            uuid: reference.uuid().map(str::to_string),
            pool_id: None,
        };
        let matches = self
            .api
            .systems_by_org(org, &query)
            .or_not_found(|| not_found(reference, org))?;
        exactly_one(matches, reference, org)
    }

    /// The system uuid, without a lookup when the user already supplied it.
    pub fn uuid(&self, org: &str, reference: &SystemRef) -> ApplicationResult<String> {
        match reference {
            SystemRef::Uuid(uuid) => Ok(uuid.clone()),
            SystemRef::Name(_) => Ok(self.system(org, reference, None)?.uuid),
        }
    }
}

fn not_found(reference: &SystemRef, org: &str) -> DomainError {
    DomainError::SystemNotFound {
        reference: reference.clone(),
        org: org.to_string(),
    }
}

fn exactly_one(
    mut matches: Vec<System>,
    reference: &SystemRef,
    org: &str,
) -> ApplicationResult<System> {
    match matches.len() {
        0 => Err(not_found(reference, org).into()),
        1 => Ok(matches.remove(0)),
        count => Err(DomainError::AmbiguousSystem {
            reference: reference.clone(),
            org: org.to_string(),
            count,
        }
        .into()),
    }
}
