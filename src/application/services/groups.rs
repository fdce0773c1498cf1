//! System group membership
//!
//! Both the system and every named group must resolve before membership is
//! touched on the server.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::SystemResolver;
use crate::application::ApplicationResult;
use crate::domain::{DomainError, System, SystemRef};
use crate::infrastructure::traits::ServerApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Add,
    Remove,
}

pub struct GroupService {
    api: Arc<dyn ServerApi>,
    resolver: Arc<SystemResolver>,
}

impl GroupService {
    pub fn new(api: Arc<dyn ServerApi>, resolver: Arc<SystemResolver>) -> Self {
        Self { api, resolver }
    }

    /// Add the system to the named groups; returns the updated record.
    pub fn add(
        &self,
        org: &str,
        reference: &SystemRef,
        group_names: &[String],
    ) -> ApplicationResult<System> {
        self.change(Membership::Add, org, reference, group_names)
    }

    /// Remove the system from the named groups; returns the updated record.
    pub fn remove(
        &self,
        org: &str,
        reference: &SystemRef,
        group_names: &[String],
    ) -> ApplicationResult<System> {
        self.change(Membership::Remove, org, reference, group_names)
    }

    #[instrument(skip(self))]
    fn change(
        &self,
        membership: Membership,
        org: &str,
        reference: &SystemRef,
        group_names: &[String],
    ) -> ApplicationResult<System> {
        let system = self.resolver.system_in_org(org, reference)?;
        let group_ids = self.group_ids(org, group_names)?;
        debug!("{:?} groups {:?} for {}", membership, group_ids, system.uuid);

        let updated = match membership {
            Membership::Add => self.api.add_system_groups(&system.uuid, &group_ids)?,
            Membership::Remove => self.api.remove_system_groups(&system.uuid, &group_ids)?,
        };
        updated.filter(|s| !s.is_empty()).ok_or_else(|| {
            DomainError::RecordRejected {
                action: "change groups of",
                name: system.name,
            }
            .into()
        })
    }

    fn group_ids(&self, org: &str, names: &[String]) -> ApplicationResult<Vec<u64>> {
        let groups = self.api.system_groups(org, names)?;
        let missing: Vec<&str> = names
            .iter()
            .filter(|name| !groups.iter().any(|g| &g.name == *name))
            .map(String::as_str)
            .collect();
        if groups.is_empty() || !missing.is_empty() {
            let names = if missing.is_empty() {
                names.join(", ")
            } else {
                missing.join(", ")
            };
            return Err(DomainError::SystemGroupNotFound {
                names,
                org: org.to_string(),
            }
            .into());
        }
        Ok(groups.iter().map(|g| g.id).collect())
    }
}
