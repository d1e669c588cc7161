//! Workflow composition.
//!
//! A workflow is a tree of [`Step`]s built up front, which lets the
//! orchestrator check every referenced group before opening a connection and
//! render a plan for `--dry-run` without touching the network.

use super::executor::CommandBatch;
use super::lifecycle::ServiceLifecycle;
use super::transfer::TransferJob;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Copy a file or directory to every target of `group`.
    Transfer { group: String, job: TransferJob },
    /// Run a command batch on every target of `group`.
    Execute { group: String, batch: CommandBatch },
    /// Run children in order, stopping after the first one that fails.
    Sequence(Vec<Step>),
    /// Bracket `inner` with the service's stop and start batches.
    WithService {
        lifecycle: ServiceLifecycle,
        inner: Box<Step>,
    },
}

impl Step {
    pub fn transfer(group: impl Into<String>, job: TransferJob) -> Self {
        Step::Transfer {
            group: group.into(),
            job,
        }
    }

    pub fn execute(group: impl Into<String>, batch: CommandBatch) -> Self {
        Step::Execute {
            group: group.into(),
            batch,
        }
    }

    pub fn sequence(steps: impl IntoIterator<Item = Step>) -> Self {
        Step::Sequence(steps.into_iter().collect())
    }

    /// Every group this step fans out to, including lifecycle groups.
    pub fn groups(&self) -> BTreeSet<&str> {
        let mut groups = BTreeSet::new();
        self.collect_groups(&mut groups);
        groups
    }

    fn collect_groups<'a>(&'a self, groups: &mut BTreeSet<&'a str>) {
        match self {
            Step::Transfer { group, .. } | Step::Execute { group, .. } => {
                groups.insert(group.as_str());
            }
            Step::Sequence(steps) => {
                for step in steps {
                    step.collect_groups(groups);
                }
            }
            Step::WithService { lifecycle, inner } => {
                groups.insert(lifecycle.group.as_str());
                inner.collect_groups(groups);
            }
        }
    }

    /// Short label used in reports, e.g. `run [echo done] on engine`.
    pub fn label(&self) -> String {
        match self {
            Step::Transfer { group, job } => format!("{} on {}", job, group),
            Step::Execute { group, batch } => format!("{} on {}", batch, group),
            Step::Sequence(steps) => format!("sequence of {} step(s)", steps.len()),
            Step::WithService { lifecycle, .. } => {
                format!("service-wrapped workflow on {}", lifecycle.group)
            }
        }
    }

    /// Stages in execution order, one per line, indented by nesting.
    pub fn plan(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.plan_into(0, &mut lines);
        lines
    }

    fn plan_into(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match self {
            Step::Transfer { .. } | Step::Execute { .. } => {
                lines.push(format!("{}{}", indent, self.label()));
            }
            Step::Sequence(steps) => {
                for step in steps {
                    step.plan_into(depth, lines);
                }
            }
            Step::WithService { lifecycle, inner } => {
                lines.push(format!(
                    "{}stop: {} on {}",
                    indent, lifecycle.stop, lifecycle.group
                ));
                inner.plan_into(depth + 1, lines);
                lines.push(format!(
                    "{}start ({}): {} on {}",
                    indent, lifecycle.policy, lifecycle.start, lifecycle.group
                ));
            }
        }
    }
}
