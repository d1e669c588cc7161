//! Per-target and aggregate results of a fan-out.

use crate::config::TargetId;
use crate::error::Error;
use crate::transport::OutputLine;

/// Result of one Transfer or Command operation on one target.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: TargetId,
    pub succeeded: bool,
    pub detail: String,
    /// Captured remote output, empty for transfers.
    pub output: Vec<OutputLine>,
    pub error: Option<Error>,
}

impl TargetOutcome {
    pub fn success(target: TargetId, detail: impl Into<String>) -> Self {
        Self {
            target,
            succeeded: true,
            detail: detail.into(),
            output: Vec::new(),
            error: None,
        }
    }

    pub fn failure(target: TargetId, error: Error) -> Self {
        Self {
            target,
            succeeded: false,
            detail: error.to_string(),
            output: Vec::new(),
            error: Some(error),
        }
    }

    pub fn with_output(mut self, output: Vec<OutputLine>) -> Self {
        self.output = output;
        self
    }
}

/// Combined verdict of one fan-out: successful only if every target is.
#[derive(Debug)]
pub struct AggregateOutcome {
    pub operation: String,
    pub outcomes: Vec<TargetOutcome>,
}

impl AggregateOutcome {
    pub fn new(operation: impl Into<String>, outcomes: Vec<TargetOutcome>) -> Self {
        Self {
            operation: operation.into(),
            outcomes,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }

    pub fn failed_targets(&self) -> Vec<&TargetId> {
        self.failures().map(|o| &o.target).collect()
    }

    pub fn outcome_for(&self, host: &str) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| o.target.host == host)
    }

    /// One line per failed target: `host:port [operation]: cause`.
    pub fn failure_summary(&self) -> Vec<String> {
        self.failures()
            .map(|o| format!("{} [{}]: {}", o.target, self.operation, o.detail))
            .collect()
    }
}

/// Stage that did not run, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStage {
    pub stage: String,
    pub reason: String,
}

/// Ordered record of every stage a workflow ran (and skipped).
#[derive(Debug, Default)]
pub struct WorkflowReport {
    pub stages: Vec<AggregateOutcome>,
    pub skipped: Vec<SkippedStage>,
    /// Failures that happened before any fan-out, e.g. a missing group.
    pub errors: Vec<Error>,
}

impl WorkflowReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully successful across every stage and every target.
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty() && self.stages.iter().all(AggregateOutcome::succeeded)
    }

    pub fn push(&mut self, stage: AggregateOutcome) {
        self.stages.push(stage);
    }

    pub fn skip(&mut self, stage: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedStage {
            stage: stage.into(),
            reason: reason.into(),
        });
    }

    pub fn fail(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Operation labels of the stages that ran, in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.operation.as_str()).collect()
    }

    /// Causal chain: every stage-level error and every failed target.
    pub fn failure_summary(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        for stage in &self.stages {
            lines.extend(stage.failure_summary());
        }
        lines
    }
}
