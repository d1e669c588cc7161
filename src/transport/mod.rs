//! Remote access primitives consumed by the orchestrator.
//!
//! A [`Transport`] opens one [`RemoteSession`] per target. Sessions expose
//! the two verbs the orchestrator needs (copy files, run a command line) and
//! keep connection failures (`Error::Connection`) distinguishable from a
//! remote process exiting non-zero (a plain exit code).
//!
//! - [`SshTransport`]: `ssh2` sessions driven on the blocking thread pool
//! - [`LocalTransport`]: maps targets onto local directories, for rehearsals

mod local;
mod ssh;

pub use local::LocalTransport;
pub use ssh::SshTransport;

use crate::config::{Artifacts, Config, RemoteTarget, TransportKind};
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Directory used by the local transport when `transport.local_root` is unset.
pub const DEFAULT_LOCAL_ROOT: &str = ".deploy-sandbox";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// One line captured from a remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

/// Sender half used by sessions to stream output lines while a command runs.
pub type LineSender = UnboundedSender<OutputLine>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open an authenticated session to `target`.
    ///
    /// Failures are reported as `Error::Connection`.
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>>;
}

#[async_trait]
pub trait RemoteSession: Send {
    /// Copy one local file to `destination`, creating parent directories.
    async fn put_file(&mut self, source: &Path, destination: &str) -> Result<()>;

    /// Recursively copy a local directory so that `source/x/y` lands at
    /// `destination/x/y`. No ordering between files is guaranteed and a
    /// failure may leave a partial tree behind.
    async fn put_dir(&mut self, source: &Path, destination: &str) -> Result<()>;

    /// Run `command` through the remote shell, sending every stdout/stderr
    /// line to `lines` as it arrives.
    ///
    /// Returns the exit code once the remote process has completed. An
    /// `Err` means the connection failed, not the command.
    async fn run(&mut self, command: &str, lines: LineSender) -> Result<i32>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Build the transport selected by `config.transport`.
pub fn from_config(config: &Config, project_root: &Path) -> Arc<dyn Transport> {
    match config.transport.kind {
        TransportKind::Ssh => Arc::new(SshTransport::new(config.connect_timeout())),
        TransportKind::Local => {
            let root = config
                .transport
                .local_root
                .as_deref()
                .unwrap_or(DEFAULT_LOCAL_ROOT);
            Arc::new(LocalTransport::new(Artifacts::resolve(project_root, root)))
        }
    }
}

/// Splits a byte stream into lines, dropping `\r` and blank lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(line) = Self::clean(&raw[..raw.len() - 1]) {
                lines.push(line);
            }
        }
        lines
    }

    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        Self::clean(&rest)
    }

    fn clean(raw: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches('\r').trim_end();
        if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
