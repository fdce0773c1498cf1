//! System lifecycle service
//!
//! Listing, inspection, registration and updates of systems.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::error_ext::ApiResultExt;
use crate::application::services::SystemResolver;
use crate::application::ApplicationResult;
use crate::domain::{
    CustomInfo, DomainError, Registration, System, SystemQuery, SystemRef, SystemUpdate, Task,
    TaskFilter,
};
use crate::infrastructure::traits::ServerApi;

/// Consumer type sent with every registration.
const CONSUMER_TYPE: &str = "system";

/// A system record together with its custom info.
#[derive(Debug, Clone)]
pub struct SystemDetails {
    pub system: System,
    pub custom_info: CustomInfo,
}

/// Where the list of available releases comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSource {
    System(SystemRef),
    Environment(String),
}

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub name: String,
    pub org: String,
    pub environment: Option<String>,
    pub activation_keys: Vec<String>,
    pub release: Option<String>,
    pub service_level: Option<String>,
    pub facts: BTreeMap<String, String>,
}

/// Requested changes; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct SystemChanges {
    pub name: Option<String>,
    pub environment: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub release: Option<String>,
    pub service_level: Option<String>,
}

pub struct SystemService {
    api: Arc<dyn ServerApi>,
    resolver: Arc<SystemResolver>,
}

impl SystemService {
    pub fn new(api: Arc<dyn ServerApi>, resolver: Arc<SystemResolver>) -> Self {
        Self { api, resolver }
    }

    #[instrument(skip(self))]
    pub fn list(
        &self,
        org: &str,
        environment: Option<&str>,
        pool_id: Option<&str>,
    ) -> ApplicationResult<Vec<System>> {
        let query = SystemQuery {
            pool_id: pool_id.map(str::to_string),
            ..Default::default()
        };
        let systems = match environment {
            Some(name) => {
                let env = self.resolver.environment(org, Some(name))?;
                self.api.systems_by_env(env.id, &query)?
            }
            None => self.api.systems_by_org(org, &query)?,
        };
        debug!("list: {} system(s)", systems.len());
        Ok(systems)
    }

    pub fn system(
        &self,
        org: &str,
        reference: &SystemRef,
        environment: Option<&str>,
    ) -> ApplicationResult<System> {
        self.resolver.system(org, reference, environment)
    }

    #[instrument(skip(self))]
    pub fn details(
        &self,
        org: &str,
        reference: &SystemRef,
        environment: Option<&str>,
    ) -> ApplicationResult<SystemDetails> {
        let system = self.resolver.system(org, reference, environment)?;
        let custom_info = self.api.custom_info(&system.custom_info_key(), None)?;
        Ok(SystemDetails {
            system,
            custom_info,
        })
    }

    /// Remote tasks of a system, scoped to an environment (library when `None`).
    #[instrument(skip(self))]
    pub fn tasks(
        &self,
        org: &str,
        reference: &SystemRef,
        environment: Option<&str>,
    ) -> ApplicationResult<Vec<Task>> {
        let env = self.resolver.environment(org, environment)?;
        let filter = TaskFilter {
            environment_id: Some(env.id),
            system_name: reference.name().map(str::to_string),
            system_uuid: reference.uuid().map(str::to_string),
        };
        Ok(self.api.tasks(org, &filter)?)
    }

    pub fn task(&self, task_id: &str) -> ApplicationResult<Task> {
        Ok(self.api.task_status(task_id)?)
    }

    #[instrument(skip(self))]
    pub fn releases(&self, org: &str, source: &ReleaseSource) -> ApplicationResult<Vec<String>> {
        let releases = match source {
            ReleaseSource::System(SystemRef::Uuid(uuid)) => self
                .api
                .releases_for_system(uuid)
                .or_not_found(|| DomainError::SystemNotFound {
                    reference: SystemRef::Uuid(uuid.clone()),
                    org: org.to_string(),
                })?,
            ReleaseSource::System(reference) => {
                let system = self.resolver.system(org, reference, None)?;
                self.api.releases_for_system(&system.uuid)?
            }
            ReleaseSource::Environment(name) => {
                let env = self.resolver.environment(org, Some(name))?;
                self.api.releases_for_environment(env.id)?
            }
        };
        Ok(releases.releases)
    }

    /// Register a new system; an empty record from the server means rejection.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub fn register(&self, request: RegisterRequest) -> ApplicationResult<System> {
        let environment_id = match request.environment.as_deref() {
            Some(name) => Some(self.resolver.environment(&request.org, Some(name))?.id),
            None => None,
        };
        let registration = Registration {
            name: request.name.clone(),
            org: request.org,
            environment_id,
            activation_keys: request.activation_keys,
            consumer_type: CONSUMER_TYPE.to_string(),
            release: request.release,
            service_level: request.service_level,
            facts: request.facts,
        };
        let system = self
            .api
            .register(&registration)?
            .filter(|s| !s.is_empty())
            .ok_or(DomainError::RecordRejected {
                action: "register",
                name: request.name,
            })?;
        info!("registered system {} ({})", system.name, system.uuid);
        Ok(system)
    }

    /// Resolve and unregister; returns the removed record.
    #[instrument(skip(self))]
    pub fn unregister(
        &self,
        org: &str,
        reference: &SystemRef,
        environment: Option<&str>,
    ) -> ApplicationResult<System> {
        let system = self.resolver.system(org, reference, environment)?;
        self.api.unregister(&system.uuid)?;
        info!("unregistered system {} ({})", system.name, system.uuid);
        Ok(system)
    }

    pub fn remove_deletion_record(&self, uuid: &str) -> ApplicationResult<()> {
        Ok(self.api.remove_deletion_record(uuid)?)
    }

    /// Apply `changes` and return the record as it was before the update.
    #[instrument(skip(self, changes))]
    pub fn update(
        &self,
        org: &str,
        reference: &SystemRef,
        environment: Option<&str>,
        changes: SystemChanges,
    ) -> ApplicationResult<System> {
        let system = self.resolver.system(org, reference, environment)?;
        let environment_id = match changes.environment.as_deref() {
            Some(name) => Some(self.resolver.environment(org, Some(name))?.id),
            None => None,
        };
        let update = SystemUpdate {
            name: changes.name,
            description: changes.description,
            location: changes.location,
            release_ver: changes.release,
            service_level: changes.service_level,
            environment_id,
        };
        let updated = self.api.update_system(&system.uuid, &update)?;
        if !updated.is_some_and(|s| !s.is_empty()) {
            return Err(DomainError::RecordRejected {
                action: "update",
                name: system.name,
            }
            .into());
        }
        Ok(system)
    }
}
