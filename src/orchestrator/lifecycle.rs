//! Service Lifecycle Wrapper: bracket a workflow with remote stop/start.
//!
//! The wrapped [`Step`] runs `stop` on the service group, then the inner
//! workflow, then `start`. What happens to `start` when an earlier stage
//! fails is decided by [`RestartPolicy`].

use super::executor::CommandBatch;
use super::workflow::Step;
use crate::config::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the start stage is guaranteed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Stop at the first failed stage; a failed stop or workflow leaves the
    /// service stopped.
    #[default]
    FailFast,
    /// Always attempt start once stop has been attempted. A failed stop
    /// still skips the inner workflow.
    BestEffortRestart,
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartPolicy::FailFast => write!(f, "fail-fast"),
            RestartPolicy::BestEffortRestart => write!(f, "best-effort-restart"),
        }
    }
}

impl FromStr for RestartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" => Ok(RestartPolicy::FailFast),
            "best-effort-restart" | "best-effort" => Ok(RestartPolicy::BestEffortRestart),
            other => Err(format!(
                "Invalid restart policy '{}'. Expected 'fail-fast' or 'best-effort-restart'",
                other
            )),
        }
    }
}

/// Stop/start batches for one service on one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLifecycle {
    pub group: String,
    pub stop: CommandBatch,
    pub start: CommandBatch,
    pub policy: RestartPolicy,
}

impl ServiceLifecycle {
    pub fn new(
        group: impl Into<String>,
        stop: CommandBatch,
        start: CommandBatch,
        policy: RestartPolicy,
    ) -> Self {
        Self {
            group: group.into(),
            stop,
            start,
            policy,
        }
    }

    pub fn from_config(service: &ServiceConfig) -> Self {
        Self::new(
            service.group.clone(),
            CommandBatch::new(service.stop_commands()),
            CommandBatch::new(service.start_commands()),
            service.restart_policy,
        )
    }

    /// Produce a workflow that runs stop, then `workflow`, then start.
    pub fn wrap(&self, workflow: Step) -> Step {
        Step::WithService {
            lifecycle: self.clone(),
            inner: Box::new(workflow),
        }
    }
}
