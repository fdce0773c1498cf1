//! Remote task polling
//!
//! Fetches task status at a fixed interval until the task reaches a terminal
//! state. Without a timeout the loop only ends on a terminal state, an API
//! error, or process termination.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Task;
use crate::infrastructure::traits::{Clock, ServerApi};

/// Delay between two status fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// `None` waits until the server reports a terminal state.
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl PollOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

pub struct TaskPoller {
    api: Arc<dyn ServerApi>,
    clock: Arc<dyn Clock>,
    options: PollOptions,
}

impl TaskPoller {
    pub fn new(api: Arc<dyn ServerApi>, clock: Arc<dyn Clock>, options: PollOptions) -> Self {
        Self {
            api,
            clock,
            options,
        }
    }

    pub fn options(&self) -> PollOptions {
        self.options
    }

    /// Single status fetch.
    pub fn status(&self, task_id: &str) -> ApplicationResult<Task> {
        Ok(self.api.task_status(task_id)?)
    }

    /// Poll until terminal and return the final snapshot.
    pub fn wait(&self, task_id: &str) -> ApplicationResult<Task> {
        self.wait_with(task_id, |_| {})
    }

    /// Like [`wait`](Self::wait), calling `on_poll` with every fetched snapshot.
    ///
    /// The first fetch is immediate. API errors are returned unchanged, never retried.
    #[instrument(skip(self, on_poll))]
    pub fn wait_with(
        &self,
        task_id: &str,
        mut on_poll: impl FnMut(&Task),
    ) -> ApplicationResult<Task> {
        let started = self.clock.now();
        let mut polls = 0u64;
        loop {
            let task = self.api.task_status(task_id)?;
            polls += 1;
            on_poll(&task);

            if task.state.is_terminal() {
                info!(
                    "task {} ended in state {} after {} poll(s)",
                    task_id,
                    task.state.as_str(),
                    polls
                );
                return Ok(task);
            }
            debug!("task {} still {}", task_id, task.state.as_str());

            if let Some(timeout) = self.options.timeout {
                let waited = self.clock.now().saturating_duration_since(started);
                if waited >= timeout {
                    return Err(ApplicationError::TaskTimeout {
                        task_id: task_id.to_string(),
                        waited,
                    });
                }
            }
            self.clock.sleep(self.options.interval);
        }
    }
}
