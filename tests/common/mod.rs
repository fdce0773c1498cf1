//! In-memory `ServerApi` and `Clock` for service and dispatch tests
//!
//! Every call is recorded as `"<method> <args>"` so tests can assert which
//! remote calls happened, and which did not.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use katello_system::config::Settings;
use katello_system::domain::{
    CustomInfo, Entitlement, Environment, NamedRef, Package, PackageAction, Pool, PoolFilter,
    Pools, Registration, Releases, Report, ReportFormat, ReportScope, Subscriptions, System,
    SystemGroup, SystemQuery, SystemUpdate, Task, TaskFilter, TaskState, UnsubscribeTarget,
};
use katello_system::infrastructure::di::ServiceContainer;
use katello_system::infrastructure::traits::{Clock, ServerApi};
use katello_system::infrastructure::{ApiError, ApiResult};

/// Methods that change server state.
pub const MUTATING: &[&str] = &[
    "register",
    "unregister",
    "remove_deletion_record",
    "update_system",
    "package_action",
    "subscribe",
    "unsubscribe",
    "add_system_groups",
    "remove_system_groups",
    "add_custom_info",
    "update_custom_info",
    "remove_custom_info",
];

#[derive(Default)]
pub struct State {
    pub environments: Vec<(String, Environment)>,
    pub org_systems: Vec<(String, System)>,
    pub env_systems: Vec<(u64, System)>,
    /// Scripted status snapshots; the last one repeats forever.
    pub task_script: BTreeMap<String, VecDeque<Task>>,
    pub created_task: Option<Task>,
    pub tasks: Vec<Task>,
    pub packages: Vec<Package>,
    pub releases: Vec<String>,
    pub entitlements: Vec<Entitlement>,
    pub pools: Vec<Pool>,
    pub groups: Vec<SystemGroup>,
    pub custom_info: CustomInfo,
    /// Override for write responses; `None` echoes a plausible record,
    /// `Some(None)` answers `null`.
    pub register_response: Option<Option<System>>,
    pub update_response: Option<Option<System>>,
    pub group_response: Option<Option<System>>,
    pub custom_info_response: Option<CustomInfo>,
    pub remove_custom_info_result: bool,
    pub report: Report,
    pub task_status_error: Option<ApiError>,
    pub calls: Vec<String>,
}

#[derive(Default)]
pub struct FakeServer {
    pub state: Mutex<State>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        let server = Self::default();
        server.state().remove_custom_info_result = true;
        Arc::new(server)
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake server state")
    }

    pub fn with_environment(self: &Arc<Self>, org: &str, id: u64, name: &str, library: bool) {
        self.state().environments.push((
            org.to_string(),
            Environment {
                id,
                name: name.to_string(),
                library,
            },
        ));
    }

    pub fn with_system(self: &Arc<Self>, org: &str, system: System) {
        self.state().org_systems.push((org.to_string(), system));
    }

    pub fn with_env_system(self: &Arc<Self>, env_id: u64, system: System) {
        self.state().env_systems.push((env_id, system));
    }

    /// Status snapshots returned by successive polls of `task_id`.
    pub fn script_task(self: &Arc<Self>, task_id: &str, states: &[(TaskState, &str)]) {
        let snapshots = states
            .iter()
            .map(|(state, description)| task(task_id, state.clone(), description))
            .collect();
        let mut st = self.state();
        st.task_script.insert(task_id.to_string(), snapshots);
        st.created_task = Some(task(task_id, TaskState::Waiting, ""));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(method))
            .count()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.iter().any(|m| c.split(' ').next() == Some(*m)))
            .collect()
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    fn find_by_uuid(&self, uuid: &str) -> Option<System> {
        let st = self.state();
        st.org_systems
            .iter()
            .map(|(_, s)| s)
            .chain(st.env_systems.iter().map(|(_, s)| s))
            .find(|s| s.uuid == uuid)
            .cloned()
    }
}

pub fn system(name: &str, uuid: &str) -> System {
    System {
        id: None,
        uuid: uuid.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn system_with_id(name: &str, uuid: &str, id: u64) -> System {
    System {
        id: Some(id),
        ..system(name, uuid)
    }
}

pub fn named(name: &str) -> NamedRef {
    NamedRef {
        id: None,
        name: name.to_string(),
    }
}

pub fn task(uuid: &str, state: TaskState, description: &str) -> Task {
    Task {
        uuid: uuid.to_string(),
        state,
        result_description: description.to_string(),
        description: None,
        system_name: None,
        created_at: None,
        finish_time: None,
    }
}

fn matches(system: &System, query: &SystemQuery) -> bool {
    query.name.as_ref().map_or(true, |n| &system.name == n)
        && query.uuid.as_ref().map_or(true, |u| &system.uuid == u)
}

impl ServerApi for FakeServer {
    fn environments(&self, org: &str, name: Option<&str>) -> ApiResult<Vec<Environment>> {
        self.record(format!("environments {} {}", org, name.unwrap_or("<library>")));
        let st = self.state();
        Ok(st
            .environments
            .iter()
            .filter(|(o, _)| o == org)
            .map(|(_, e)| e)
            .filter(|e| match name {
                Some(name) => e.name == name,
                None => e.library,
            })
            .cloned()
            .collect())
    }

    fn systems_by_org(&self, org: &str, query: &SystemQuery) -> ApiResult<Vec<System>> {
        self.record(format!("systems_by_org {} {:?}", org, query.pairs()));
        let st = self.state();
        Ok(st
            .org_systems
            .iter()
            .filter(|(o, s)| o == org && matches(s, query))
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn systems_by_env(&self, env_id: u64, query: &SystemQuery) -> ApiResult<Vec<System>> {
        self.record(format!("systems_by_env {} {:?}", env_id, query.pairs()));
        let st = self.state();
        Ok(st
            .env_systems
            .iter()
            .filter(|(id, s)| *id == env_id && matches(s, query))
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn system(&self, uuid: &str) -> ApiResult<System> {
        self.record(format!("system {}", uuid));
        self.find_by_uuid(uuid)
            .ok_or_else(|| ApiError::not_found(format!("/systems/{uuid}")))
    }

    fn register(&self, registration: &Registration) -> ApiResult<Option<System>> {
        self.record(format!(
            "register {} {:?} {:?}",
            registration.name, registration.environment_id, registration.activation_keys
        ));
        let response = self.state().register_response.clone();
        Ok(response.unwrap_or_else(|| Some(system(&registration.name, "new-uuid"))))
    }

    fn unregister(&self, uuid: &str) -> ApiResult<()> {
        self.record(format!("unregister {}", uuid));
        Ok(())
    }

    fn remove_deletion_record(&self, uuid: &str) -> ApiResult<()> {
        self.record(format!("remove_deletion_record {}", uuid));
        Ok(())
    }

    fn update_system(&self, uuid: &str, update: &SystemUpdate) -> ApiResult<Option<System>> {
        self.record(format!("update_system {} {:?}", uuid, update));
        let response = self.state().update_response.clone();
        match response {
            Some(s) => Ok(s),
            None => self
                .find_by_uuid(uuid)
                .map(Some)
                .ok_or_else(|| ApiError::not_found(format!("/systems/{uuid}"))),
        }
    }

    fn releases_for_system(&self, uuid: &str) -> ApiResult<Releases> {
        self.record(format!("releases_for_system {}", uuid));
        Ok(Releases {
            releases: self.state().releases.clone(),
        })
    }

    fn releases_for_environment(&self, env_id: u64) -> ApiResult<Releases> {
        self.record(format!("releases_for_environment {}", env_id));
        Ok(Releases {
            releases: self.state().releases.clone(),
        })
    }

    fn packages(&self, uuid: &str) -> ApiResult<Vec<Package>> {
        self.record(format!("packages {}", uuid));
        Ok(self.state().packages.clone())
    }

    fn package_action(&self, uuid: &str, action: &PackageAction) -> ApiResult<Task> {
        self.record(format!(
            "package_action {} {} {}",
            uuid,
            action.label(),
            action.names().join(",")
        ));
        let created = self.state().created_task.clone();
        Ok(created.unwrap_or_else(|| task("task-1", TaskState::Waiting, "")))
    }

    fn task_status(&self, task_id: &str) -> ApiResult<Task> {
        self.record(format!("task_status {}", task_id));
        let mut st = self.state();
        if let Some(err) = st.task_status_error.clone() {
            return Err(err);
        }
        let script = st
            .task_script
            .get_mut(task_id)
            .ok_or_else(|| ApiError::not_found(format!("/systems/tasks/{task_id}")))?;
        let snapshot = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        snapshot.ok_or_else(|| ApiError::not_found(format!("/systems/tasks/{task_id}")))
    }

    fn tasks(&self, org: &str, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
        self.record(format!("tasks {} {:?}", org, filter));
        Ok(self.state().tasks.clone())
    }

    fn subscribe(&self, uuid: &str, pool: &str, quantity: u32) -> ApiResult<()> {
        self.record(format!("subscribe {} {} {}", uuid, pool, quantity));
        Ok(())
    }

    fn subscriptions(&self, uuid: &str) -> ApiResult<Subscriptions> {
        self.record(format!("subscriptions {}", uuid));
        Ok(Subscriptions {
            entitlements: self.state().entitlements.clone(),
        })
    }

    fn available_pools(&self, uuid: &str, filter: PoolFilter) -> ApiResult<Pools> {
        self.record(format!("available_pools {} {:?}", uuid, filter));
        Ok(Pools {
            pools: self.state().pools.clone(),
        })
    }

    fn unsubscribe(&self, uuid: &str, target: &UnsubscribeTarget) -> ApiResult<()> {
        self.record(format!("unsubscribe {} {:?}", uuid, target));
        Ok(())
    }

    fn report(&self, scope: &ReportScope, format: ReportFormat) -> ApiResult<Report> {
        self.record(format!("report {:?} {}", scope, format));
        Ok(self.state().report.clone())
    }

    fn system_groups(&self, org: &str, names: &[String]) -> ApiResult<Vec<SystemGroup>> {
        self.record(format!("system_groups {} {}", org, names.join(",")));
        Ok(self
            .state()
            .groups
            .iter()
            .filter(|g| names.contains(&g.name))
            .cloned()
            .collect())
    }

    fn add_system_groups(&self, uuid: &str, group_ids: &[u64]) -> ApiResult<Option<System>> {
        self.record(format!("add_system_groups {} {:?}", uuid, group_ids));
        self.group_response(uuid)
    }

    fn remove_system_groups(&self, uuid: &str, group_ids: &[u64]) -> ApiResult<Option<System>> {
        self.record(format!("remove_system_groups {} {:?}", uuid, group_ids));
        self.group_response(uuid)
    }

    fn custom_info(&self, system_key: &str, keyname: Option<&str>) -> ApiResult<CustomInfo> {
        self.record(format!("custom_info {} {:?}", system_key, keyname));
        let info = self.state().custom_info.clone();
        Ok(match keyname {
            Some(key) => info.into_iter().filter(|(k, _)| k == key).collect(),
            None => info,
        })
    }

    fn add_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        value: &str,
    ) -> ApiResult<CustomInfo> {
        self.record(format!("add_custom_info {} {} {}", system_key, keyname, value));
        let mut st = self.state();
        if let Some(response) = st.custom_info_response.clone() {
            return Ok(response);
        }
        st.custom_info
            .entry(keyname.to_string())
            .or_default()
            .push(value.to_string());
        Ok(st.custom_info.clone())
    }

    fn update_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        current: &str,
        new: &str,
    ) -> ApiResult<CustomInfo> {
        self.record(format!(
            "update_custom_info {} {} {} {}",
            system_key, keyname, current, new
        ));
        let mut st = self.state();
        if let Some(response) = st.custom_info_response.clone() {
            return Ok(response);
        }
        if let Some(values) = st.custom_info.get_mut(keyname) {
            for v in values.iter_mut().filter(|v| v.as_str() == current) {
                *v = new.to_string();
            }
        }
        Ok(st.custom_info.clone())
    }

    fn remove_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        value: Option<&str>,
    ) -> ApiResult<bool> {
        self.record(format!(
            "remove_custom_info {} {} {:?}",
            system_key, keyname, value
        ));
        Ok(self.state().remove_custom_info_result)
    }
}

impl FakeServer {
    fn group_response(&self, uuid: &str) -> ApiResult<Option<System>> {
        let response = self.state().group_response.clone();
        match response {
            Some(s) => Ok(s),
            None => self
                .find_by_uuid(uuid)
                .map(Some)
                .ok_or_else(|| ApiError::not_found(format!("/systems/{uuid}"))),
        }
    }
}

/// Clock that advances only when slept on.
pub struct FakeClock {
    now: Mutex<Instant>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps").clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("now")
    }

    fn sleep(&self, duration: Duration) {
        *self.now.lock().expect("now") += duration;
        self.sleeps.lock().expect("sleeps").push(duration);
    }
}

/// Container over the fake server with default settings.
pub fn container(server: &Arc<FakeServer>, clock: &Arc<FakeClock>) -> ServiceContainer {
    container_with(server, clock, Settings::default())
}

pub fn container_with(
    server: &Arc<FakeServer>,
    clock: &Arc<FakeClock>,
    settings: Settings,
) -> ServiceContainer {
    ServiceContainer::with_deps(settings, server.clone(), clock.clone())
}
