//! Transfer Engine: copy one file or directory tree to every target of a group.

use super::fanout::fan_out;
use super::outcome::{AggregateOutcome, TargetOutcome};
use crate::config::RemoteTarget;
use crate::error::Result;
use crate::output::UserOutput;
use crate::registry::RemoteGroup;
use crate::transport::Transport;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    File,
    Directory,
}

/// What to copy and where. Executed independently against every target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    source: PathBuf,
    destination: String,
    kind: TransferKind,
}

impl TransferJob {
    pub fn file(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: TransferKind::File,
        }
    }

    pub fn directory(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: TransferKind::Directory,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }
}

impl fmt::Display for TransferJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TransferKind::File => "file",
            TransferKind::Directory => "directory",
        };
        write!(
            f,
            "transfer {} {} -> {}",
            kind,
            self.source.display(),
            self.destination
        )
    }
}

/// Short-lived engine borrowed from the orchestrator for one fan-out.
pub struct TransferEngine<'a> {
    transport: &'a dyn Transport,
    output: &'a dyn UserOutput,
}

impl<'a> TransferEngine<'a> {
    pub fn new(transport: &'a dyn Transport, output: &'a dyn UserOutput) -> Self {
        Self { transport, output }
    }

    /// Copy `job` to every target of `group` in parallel.
    ///
    /// Returns once every target is terminal. Connection and copy errors
    /// become failed outcomes for that target only.
    pub async fn transfer(&self, job: &TransferJob, group: &RemoteGroup) -> AggregateOutcome {
        tracing::info!(
            "Transferring {} to {} target(s) in group '{}'",
            job.source().display(),
            group.len(),
            group.name()
        );
        fan_out(job.to_string(), group, |target| self.transfer_to(job, target)).await
    }

    async fn transfer_to(&self, job: &TransferJob, target: &RemoteTarget) -> TargetOutcome {
        self.output.status(&format!(
            "starting transfer to {}: {}",
            target.host,
            job.destination()
        ));

        match self.copy(job, target).await {
            Ok(()) => {
                self.output.success(&format!(
                    "finished transfer to {}: {}",
                    target.host,
                    job.destination()
                ));
                TargetOutcome::success(target.id(), format!("copied to {}", job.destination()))
            }
            Err(e) => {
                tracing::warn!("Transfer to {} failed: {}", target.id(), e);
                self.output.error(&format!(
                    "failed transfer to {}: {} ({})",
                    target.host,
                    job.destination(),
                    e
                ));
                TargetOutcome::failure(target.id(), e)
            }
        }
    }

    /// Connect, copy, and close the session whatever the copy returned.
    async fn copy(&self, job: &TransferJob, target: &RemoteTarget) -> Result<()> {
        let mut session = self.transport.connect(target).await?;

        let copied = match job.kind() {
            TransferKind::File => session.put_file(job.source(), job.destination()).await,
            TransferKind::Directory => session.put_dir(job.source(), job.destination()).await,
        };
        let closed = session.close().await;

        copied?;
        closed
    }
}
