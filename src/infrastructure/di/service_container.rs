//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    CustomInfoService, GroupService, PackageService, PollOptions, ReportService,
    SubscriptionService, SystemResolver, SystemService, TaskPoller,
};
use crate::config::Settings;
use crate::infrastructure::http::HttpApi;
use crate::infrastructure::traits::{Clock, ServerApi, SystemClock};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
///
/// One HTTP client per invocation, shared by every service.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub resolver: Arc<SystemResolver>,
    pub poller: Arc<TaskPoller>,
    pub systems: SystemService,
    pub packages: PackageService,
    pub subscriptions: SubscriptionService,
    pub groups: GroupService,
    pub custom_info: CustomInfoService,
    pub reports: ReportService,
}

impl ServiceContainer {
    /// Create a new service container talking to the configured server.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let api = HttpApi::new(&settings.server)?;
        Ok(Self::with_deps(
            settings,
            Arc::new(api),
            Arc::new(SystemClock),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, api: Arc<dyn ServerApi>, clock: Arc<dyn Clock>) -> Self {
        let settings = Arc::new(settings);
        let resolver = Arc::new(SystemResolver::new(Arc::clone(&api)));
        let poller = Arc::new(TaskPoller::new(
            Arc::clone(&api),
            clock,
            PollOptions::with_timeout(settings.tasks.timeout()),
        ));

        Self {
            systems: SystemService::new(Arc::clone(&api), Arc::clone(&resolver)),
            packages: PackageService::new(Arc::clone(&api), Arc::clone(&poller)),
            subscriptions: SubscriptionService::new(Arc::clone(&api)),
            groups: GroupService::new(Arc::clone(&api), Arc::clone(&resolver)),
            custom_info: CustomInfoService::new(Arc::clone(&api)),
            reports: ReportService::new(
                Arc::clone(&api),
                Arc::clone(&resolver),
                settings.report_dir.clone(),
            ),
            settings,
            resolver,
            poller,
        }
    }
}
