//! Task Dispatcher: map a task identifier to a workflow and run it.
//!
//! Resolution happens before anything touches the network, so an unknown
//! task or an unconfigured group is reported without a single connection.

use super::executor::CommandBatch;
use super::lifecycle::{RestartPolicy, ServiceLifecycle};
use super::outcome::WorkflowReport;
use super::transfer::TransferJob;
use super::workflow::Step;
use super::Orchestrator;
use crate::config::{Artifacts, Config, GroupConfig};
use crate::error::{Error, Result};
use std::path::Path;

/// Task run when none is named.
pub const DEFAULT_TASK: &str = "all";

/// Group that receives the engine artifacts and runs the service.
pub const ENGINE_GROUP: &str = "engine";

/// Group holding the control (ansible) host.
pub const CONTROL_GROUP: &str = "ansible";

/// A named, dispatchable workflow.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub step: Step,
}

impl Task {
    pub fn new(name: impl Into<String>, description: impl Into<String>, step: Step) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: description.into(),
            step,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn matches(&self, id: &str) -> bool {
        self.name == id || self.aliases.iter().any(|a| a == id)
    }
}

/// Ordered set of tasks known to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
}

impl TaskCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. A later task with the same name replaces the earlier one.
    pub fn register(&mut self, task: Task) {
        self.tasks.retain(|t| t.name != task.name);
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn resolve(&self, id: &str) -> Result<&Task> {
        let id = id.trim();
        self.tasks
            .iter()
            .find(|t| t.matches(id))
            .ok_or_else(|| Error::UnknownTask(id.to_string()))
    }

    /// Override the restart policy of every service-wrapped step.
    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        for task in &mut self.tasks {
            set_policy(&mut task.step, policy);
        }
        self
    }

    /// Build the deploy tasks from the project configuration.
    ///
    /// `jar`, `dependencies` and `all` are wrapped in the service lifecycle
    /// when a `service:` section exists. `push-config` is only registered
    /// when the path of the loaded config file is known.
    pub fn from_config(config: &Config, project_root: &Path, config_path: Option<&Path>) -> Self {
        let engine = config.groups.get(ENGINE_GROUP).cloned().unwrap_or_default();
        let control = config.groups.get(CONTROL_GROUP).cloned().unwrap_or_default();
        let lifecycle = config.service.as_ref().map(ServiceLifecycle::from_config);
        let wrap = |step: Step| match &lifecycle {
            Some(lifecycle) => lifecycle.wrap(step),
            None => step,
        };

        let artifacts = &config.artifacts;
        let jar = upload(project_root, &engine, &artifacts.jar, false, "jar");
        let tests = upload(project_root, &engine, &artifacts.tests_jar, false, "tests");
        let dependencies = upload(
            project_root,
            &engine,
            &artifacts.dependencies,
            true,
            "dependencies",
        );

        let control_step = Step::sequence([
            Step::transfer(
                CONTROL_GROUP,
                TransferJob::directory(
                    Artifacts::resolve(project_root, &artifacts.control_dir),
                    control.remote_path(""),
                ),
            ),
            Step::execute(CONTROL_GROUP, notify("control")),
        ]);

        let mut catalog = Self::new();
        catalog.register(
            Task::new(
                "all",
                "Upload the jar, tests jar and dependencies to the engine group",
                wrap(Step::sequence([
                    jar.clone(),
                    tests.clone(),
                    dependencies.clone(),
                ])),
            )
            .alias("a"),
        );
        catalog.register(
            Task::new("jar", "Upload the engine jar", wrap(jar)).alias("j"),
        );
        catalog.register(
            Task::new(
                "dependencies",
                "Upload the dependency jar directory",
                wrap(dependencies),
            )
            .alias("d"),
        );
        catalog.register(Task::new("tests", "Upload the tests jar", tests).alias("t"));
        catalog.register(
            Task::new(
                "control",
                "Upload the ansible control directory to the control group",
                control_step,
            )
            .alias("c"),
        );

        if let Some(path) = config_path {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "remote-deploy.yaml".to_string());
            catalog.register(Task::new(
                "push-config",
                "Upload the deploy configuration to the control group",
                Step::sequence([
                    Step::transfer(
                        CONTROL_GROUP,
                        TransferJob::file(path, format!("/tmp/{}", file_name)),
                    ),
                    Step::execute(
                        CONTROL_GROUP,
                        CommandBatch::new(["echo \"Remote config uploaded to Ansible host\""]),
                    ),
                ]),
            ));
        }

        catalog
    }
}

/// Transfer an artifact into the engine base path, then announce it.
fn upload(root: &Path, group: &GroupConfig, artifact: &str, directory: bool, label: &str) -> Step {
    let source = Artifacts::resolve(root, artifact);
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.to_string());
    let destination = group.remote_path(&name);
    let job = if directory {
        TransferJob::directory(source, destination)
    } else {
        TransferJob::file(source, destination)
    };
    Step::sequence([
        Step::transfer(ENGINE_GROUP, job),
        Step::execute(ENGINE_GROUP, notify(label)),
    ])
}

fn notify(label: &str) -> CommandBatch {
    CommandBatch::new([format!("echo \"finished uploading {}\"", label)])
}

fn set_policy(step: &mut Step, policy: RestartPolicy) {
    match step {
        Step::Transfer { .. } | Step::Execute { .. } => {}
        Step::Sequence(steps) => {
            for step in steps {
                set_policy(step, policy);
            }
        }
        Step::WithService { lifecycle, inner } => {
            lifecycle.policy = policy;
            set_policy(inner, policy);
        }
    }
}

/// Resolves task identifiers against a catalog and runs them.
pub struct Dispatcher<'a> {
    orchestrator: &'a Orchestrator,
    catalog: &'a TaskCatalog,
}

impl<'a> Dispatcher<'a> {
    pub fn new(orchestrator: &'a Orchestrator, catalog: &'a TaskCatalog) -> Self {
        Self {
            orchestrator,
            catalog,
        }
    }

    /// Run the task named `task_id`.
    ///
    /// Configuration errors (unknown task, missing or empty group) are
    /// returned before any connection. A workflow that ran but did not
    /// fully succeed becomes [`Error::Aggregation`] carrying every failed
    /// target and skipped stage.
    pub async fn dispatch(&self, task_id: &str) -> Result<WorkflowReport> {
        let task = self.catalog.resolve(task_id)?;
        tracing::info!("Dispatching task '{}'", task.name);

        let report = self.orchestrator.run(&task.step).await?;
        if report.succeeded() {
            tracing::info!("Task '{}' completed", task.name);
            return Ok(report);
        }

        let mut failures = report.failure_summary();
        failures.extend(
            report
                .skipped
                .iter()
                .map(|s| format!("skipped {} ({})", s.stage, s.reason)),
        );
        Err(Error::Aggregation {
            task: task.name.clone(),
            failures,
        })
    }

    /// Stages `task_id` would run, after the same checks `dispatch` makes.
    pub fn plan(&self, task_id: &str) -> Result<Vec<String>> {
        let task = self.catalog.resolve(task_id)?;
        self.orchestrator.plan(&task.step)
    }

    /// Process exit status for a dispatch result.
    pub fn exit_code<T>(result: &Result<T>) -> i32 {
        match result {
            Ok(_) => 0,
            Err(_) => 1,
        }
    }
}
