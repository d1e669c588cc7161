//! Command Executor: run an ordered, short-circuiting batch on every target.

use super::fanout::fan_out;
use super::outcome::{AggregateOutcome, TargetOutcome};
use crate::config::RemoteTarget;
use crate::error::{Error, Result};
use crate::output::UserOutput;
use crate::registry::RemoteGroup;
use crate::transport::{OutputLine, Transport};
use std::fmt;
use tokio::sync::mpsc;

/// Operator the remote shell uses to run the next command only if the
/// previous one succeeded.
pub const SEQUENTIAL_AND: &str = " && ";

/// Ordered, immutable list of opaque shell commands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandBatch {
    commands: Vec<String>,
}

impl CommandBatch {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The single remote invocation: commands chained with `&&`.
    pub fn command_line(&self) -> String {
        self.commands.join(SEQUENTIAL_AND)
    }
}

impl fmt::Display for CommandBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run [{}]", self.commands.join("; "))
    }
}

pub struct CommandExecutor<'a> {
    transport: &'a dyn Transport,
    output: &'a dyn UserOutput,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(transport: &'a dyn Transport, output: &'a dyn UserOutput) -> Self {
        Self { transport, output }
    }

    /// Run `batch` on every target of `group` in parallel.
    ///
    /// Success per target is the exit status of the chained command line;
    /// output lines are attributed to their host but never decide success.
    /// An empty batch succeeds without connecting.
    pub async fn execute(&self, batch: &CommandBatch, group: &RemoteGroup) -> AggregateOutcome {
        if batch.is_empty() {
            let outcomes = group
                .targets()
                .iter()
                .map(|t| TargetOutcome::success(t.id(), "empty batch"))
                .collect();
            return AggregateOutcome::new(batch.to_string(), outcomes);
        }

        let command_line = batch.command_line();
        tracing::info!(
            "Running `{}` on {} target(s) in group '{}'",
            command_line,
            group.len(),
            group.name()
        );
        fan_out(batch.to_string(), group, |target| {
            self.execute_on(&command_line, target)
        })
        .await
    }

    async fn execute_on(&self, command_line: &str, target: &RemoteTarget) -> TargetOutcome {
        let (exit_code, output) = match self.run(command_line, target).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Command batch on {} failed: {}", target.id(), e);
                self.output
                    .error(&format!("[{}] connection failed: {}", target.host, e));
                return TargetOutcome::failure(target.id(), e);
            }
        };

        if exit_code == 0 {
            TargetOutcome::success(target.id(), "exit status 0").with_output(output)
        } else {
            self.output.error(&format!(
                "[{}] command batch exited with status {}",
                target.host, exit_code
            ));
            TargetOutcome::failure(
                target.id(),
                Error::Command {
                    host: target.host.clone(),
                    exit_code,
                },
            )
            .with_output(output)
        }
    }

    /// Open a session, run the command line while forwarding its output,
    /// then close the session.
    async fn run(&self, command_line: &str, target: &RemoteTarget) -> Result<(i32, Vec<OutputLine>)> {
        let mut session = self.transport.connect(target).await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
        let forward = async {
            let mut captured = Vec::new();
            while let Some(line) = rx.recv().await {
                self.output.remote_line(&target.host, line.stream, &line.text);
                captured.push(line);
            }
            captured
        };
        // The sender is moved into `run`, so `forward` ends when the remote
        // process has completed and its streams are drained.
        let (status, captured) = tokio::join!(session.run(command_line, tx), forward);
        let closed = session.close().await;

        let exit_code = status?;
        closed?;
        Ok((exit_code, captured))
    }
}
