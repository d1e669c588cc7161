use super::builder::OrchestratorBuilder;
use super::executor::{CommandBatch, CommandExecutor};
use super::lifecycle::{RestartPolicy, ServiceLifecycle};
use super::outcome::{AggregateOutcome, WorkflowReport};
use super::transfer::{TransferEngine, TransferJob};
use super::workflow::Step;
use crate::error::Result;
use crate::output::UserOutput;
use crate::registry::Registry;
use crate::transport::Transport;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Drives workflows against the remote groups of a [`Registry`].
///
/// The registry is shared read-only by every fan-out; the orchestrator
/// itself holds no mutable state, so all methods take `&self`.
pub struct Orchestrator {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    output: Arc<dyn UserOutput>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<dyn Transport>,
        output: Arc<dyn UserOutput>,
    ) -> Self {
        Self {
            registry,
            transport,
            output,
        }
    }

    /// Create a builder for constructing an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn output(&self) -> &dyn UserOutput {
        self.output.as_ref()
    }

    /// Fan a transfer out to `group`. Fails before connecting if the group
    /// is missing or empty.
    pub async fn transfer(&self, job: &TransferJob, group: &str) -> Result<AggregateOutcome> {
        let group = self.registry.group(group)?;
        let engine = TransferEngine::new(self.transport.as_ref(), self.output.as_ref());
        Ok(engine.transfer(job, group).await)
    }

    /// Fan a command batch out to `group`. Fails before connecting if the
    /// group is missing or empty.
    pub async fn execute(&self, batch: &CommandBatch, group: &str) -> Result<AggregateOutcome> {
        let group = self.registry.group(group)?;
        let executor = CommandExecutor::new(self.transport.as_ref(), self.output.as_ref());
        Ok(executor.execute(batch, group).await)
    }

    /// Check every group `step` references.
    pub fn check(&self, step: &Step) -> Result<()> {
        self.registry.check_groups(step.groups())
    }

    /// Stages `step` would run, after the same group checks as [`run`](Self::run).
    pub fn plan(&self, step: &Step) -> Result<Vec<String>> {
        self.check(step)?;
        Ok(step.plan())
    }

    /// Run a workflow to completion.
    ///
    /// Returns `Err` only for configuration problems found before any
    /// connection is opened; remote failures are recorded in the report.
    pub async fn run(&self, step: &Step) -> Result<WorkflowReport> {
        self.check(step)?;
        let mut report = WorkflowReport::new();
        self.run_step(step, &mut report).await;
        Ok(report)
    }

    /// Returns whether the step (and everything under it) succeeded.
    // Boxed for async recursion through Sequence / WithService.
    fn run_step<'a>(&'a self, step: &'a Step, report: &'a mut WorkflowReport) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match step {
                Step::Transfer { group, job } => {
                    let result = self.transfer(job, group).await;
                    record(report, result)
                }
                Step::Execute { group, batch } => {
                    let result = self.execute(batch, group).await;
                    record(report, result)
                }
                Step::Sequence(steps) => {
                    for (index, child) in steps.iter().enumerate() {
                        if !self.run_step(child, report).await {
                            for rest in &steps[index + 1..] {
                                report.skip(rest.label(), format!("'{}' failed", child.label()));
                            }
                            return false;
                        }
                    }
                    true
                }
                Step::WithService { lifecycle, inner } => {
                    self.run_with_service(lifecycle, inner, report).await
                }
            }
        })
    }

    async fn run_with_service(
        &self,
        lifecycle: &ServiceLifecycle,
        inner: &Step,
        report: &mut WorkflowReport,
    ) -> bool {
        self.output
            .status(&format!("Stopping service on group '{}'", lifecycle.group));
        let result = self.execute(&lifecycle.stop, &lifecycle.group).await;
        let stopped = record(report, result);

        let worked = if stopped {
            self.run_step(inner, report).await
        } else {
            report.skip(inner.label(), "stop stage failed");
            false
        };

        if !worked && lifecycle.policy == RestartPolicy::FailFast {
            let reason = if stopped {
                "wrapped workflow failed"
            } else {
                "stop stage failed"
            };
            tracing::warn!(
                "Skipping service start on '{}': {} (restart policy {})",
                lifecycle.group,
                reason,
                lifecycle.policy
            );
            self.output.warning(&format!(
                "Skipping service start on group '{}': {}",
                lifecycle.group, reason
            ));
            report.skip(format!("{} on {}", lifecycle.start, lifecycle.group), reason);
            return false;
        }

        self.output
            .status(&format!("Starting service on group '{}'", lifecycle.group));
        let result = self.execute(&lifecycle.start, &lifecycle.group).await;
        let started = record(report, result);
        worked && started
    }
}

fn record(report: &mut WorkflowReport, result: Result<AggregateOutcome>) -> bool {
    match result {
        Ok(stage) => {
            let succeeded = stage.succeeded();
            report.push(stage);
            succeeded
        }
        Err(e) => {
            report.fail(e);
            false
        }
    }
}
