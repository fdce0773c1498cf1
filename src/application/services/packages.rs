//! Installed packages and remote package actions

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::services::TaskPoller;
use crate::application::ApplicationResult;
use crate::domain::{Package, PackageAction, Task};
use crate::infrastructure::traits::ServerApi;

pub struct PackageService {
    api: Arc<dyn ServerApi>,
    poller: Arc<TaskPoller>,
}

impl PackageService {
    pub fn new(api: Arc<dyn ServerApi>, poller: Arc<TaskPoller>) -> Self {
        Self { api, poller }
    }

    pub fn installed(&self, uuid: &str) -> ApplicationResult<Vec<Package>> {
        Ok(self.api.packages(uuid)?)
    }

    /// Issue the single task-creating call for `action`.
    #[instrument(skip(self))]
    pub fn start(&self, uuid: &str, action: &PackageAction) -> ApplicationResult<Task> {
        let task = self.api.package_action(uuid, action)?;
        info!(
            "{} of {} item(s) started as task {}",
            action.label(),
            action.names().len(),
            task.uuid
        );
        Ok(task)
    }

    /// Wait for a started action to finish.
    pub fn wait(&self, task: &Task, on_poll: impl FnMut(&Task)) -> ApplicationResult<Task> {
        self.poller.wait_with(&task.uuid, on_poll)
    }
}
