//! I/O boundary traits for testability
//!
//! These traits abstract the remote server and the passage of time, allowing
//! services to be tested with in-memory implementations.

use std::time::{Duration, Instant};

use crate::domain::{
    CustomInfo, Environment, Package, PackageAction, PoolFilter, Pools, Registration, Releases,
    Report, ReportFormat, ReportScope, Subscriptions, System, SystemGroup, SystemQuery,
    SystemUpdate, Task, TaskFilter, UnsubscribeTarget,
};
use crate::infrastructure::error::ApiResult;

/// Remote content-management API, one method per endpoint.
///
/// Implementations never retry; every failure is returned as-is.
pub trait ServerApi: Send + Sync {
    // ---- environments -------------------------------------------------

    /// Environments of `org` named `name`, or the library environment when `name` is None.
    fn environments(&self, org: &str, name: Option<&str>) -> ApiResult<Vec<Environment>>;

    // ---- systems ------------------------------------------------------

    fn systems_by_org(&self, org: &str, query: &SystemQuery) -> ApiResult<Vec<System>>;

    fn systems_by_env(&self, env_id: u64, query: &SystemQuery) -> ApiResult<Vec<System>>;

    /// Full system record.
    fn system(&self, uuid: &str) -> ApiResult<System>;

    /// Create a system; `None` when the server answers `null`.
    fn register(&self, registration: &Registration) -> ApiResult<Option<System>>;

    fn unregister(&self, uuid: &str) -> ApiResult<()>;

    /// Drop the deletion record the server keeps for a removed hypervisor.
    fn remove_deletion_record(&self, uuid: &str) -> ApiResult<()>;

    fn update_system(&self, uuid: &str, update: &SystemUpdate) -> ApiResult<Option<System>>;

    fn releases_for_system(&self, uuid: &str) -> ApiResult<Releases>;

    fn releases_for_environment(&self, env_id: u64) -> ApiResult<Releases>;

    // ---- packages and tasks -------------------------------------------

    fn packages(&self, uuid: &str) -> ApiResult<Vec<Package>>;

    /// Start a remote package operation; returns the created task.
    fn package_action(&self, uuid: &str, action: &PackageAction) -> ApiResult<Task>;

    fn task_status(&self, task_id: &str) -> ApiResult<Task>;

    fn tasks(&self, org: &str, filter: &TaskFilter) -> ApiResult<Vec<Task>>;

    // ---- subscriptions ------------------------------------------------

    fn subscribe(&self, uuid: &str, pool: &str, quantity: u32) -> ApiResult<()>;

    fn subscriptions(&self, uuid: &str) -> ApiResult<Subscriptions>;

    fn available_pools(&self, uuid: &str, filter: PoolFilter) -> ApiResult<Pools>;

    fn unsubscribe(&self, uuid: &str, target: &UnsubscribeTarget) -> ApiResult<()>;

    // ---- reports ------------------------------------------------------

    fn report(&self, scope: &ReportScope, format: ReportFormat) -> ApiResult<Report>;

    // ---- system groups ------------------------------------------------

    fn system_groups(&self, org: &str, names: &[String]) -> ApiResult<Vec<SystemGroup>>;

    /// Updated record, or `None` when the server answers `null`.
    fn add_system_groups(&self, uuid: &str, group_ids: &[u64]) -> ApiResult<Option<System>>;

    fn remove_system_groups(&self, uuid: &str, group_ids: &[u64]) -> ApiResult<Option<System>>;

    // ---- custom info --------------------------------------------------

    fn custom_info(&self, system_key: &str, keyname: Option<&str>) -> ApiResult<CustomInfo>;

    fn add_custom_info(&self, system_key: &str, keyname: &str, value: &str)
        -> ApiResult<CustomInfo>;

    fn update_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        current: &str,
        new: &str,
    ) -> ApiResult<CustomInfo>;

    /// Returns whether the server reported the entry as removed.
    fn remove_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        value: Option<&str>,
    ) -> ApiResult<bool>;
}

/// Source of time for polling loops.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
