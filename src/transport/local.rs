use super::{LineBuffer, LineSender, OutputLine, OutputStream, RemoteSession, Transport};
use crate::config::RemoteTarget;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use walkdir::WalkDir;

/// Transport that plays every target out on the local machine.
///
/// Each target gets its own directory `<root>/<host>_<port>/`; remote paths
/// are resolved inside it and commands run there with `sh -c`, with
/// `REMOTE_HOST` and `REMOTE_PORT` set. Useful for rehearsing a task before
/// pointing it at real hosts.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory standing in for the filesystem root of `target`.
    pub fn target_root(&self, target: &RemoteTarget) -> PathBuf {
        self.root.join(format!("{}_{}", target.host, target.port))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>> {
        let dir = self.target_root(target);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Connection {
                host: target.host.clone(),
                reason: format!("cannot prepare {}: {}", dir.display(), e),
            })?;

        Ok(Box::new(LocalSession {
            host: target.host.clone(),
            port: target.port,
            dir,
        }))
    }
}

struct LocalSession {
    host: String,
    port: u16,
    dir: PathBuf,
}

impl LocalSession {
    /// Resolve a remote path inside the target directory. `..` is refused
    /// so nothing lands outside it.
    fn map(&self, source: &Path, remote: &str) -> Result<PathBuf> {
        let relative = Path::new(remote.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(self.transfer_error(source, remote, "destination escapes the target root"));
        }
        Ok(self.dir.join(relative))
    }

    fn transfer_error(&self, source: &Path, destination: &str, e: impl std::fmt::Display) -> Error {
        Error::Transfer {
            host: self.host.clone(),
            reason: format!("{} -> {}: {}", source.display(), destination, e),
        }
    }
}

#[async_trait]
impl RemoteSession for LocalSession {
    async fn put_file(&mut self, source: &Path, destination: &str) -> Result<()> {
        let dest = self.map(source, destination)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.transfer_error(source, destination, e))?;
        }
        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| self.transfer_error(source, destination, e))?;
        Ok(())
    }

    async fn put_dir(&mut self, source: &Path, destination: &str) -> Result<()> {
        let src = source.to_path_buf();
        let dest = self.map(source, destination)?;
        tokio::task::spawn_blocking(move || copy_tree(&src, &dest))
            .await
            .map_err(|e| self.transfer_error(source, destination, e))?
            .map_err(|e| self.transfer_error(source, destination, e))
    }

    async fn run(&mut self, command: &str, lines: LineSender) -> Result<i32> {
        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.dir)
            .env("REMOTE_HOST", &self.host)
            .env("REMOTE_PORT", self.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Connection {
                host: self.host.clone(),
                reason: format!("failed to spawn shell: {}", e),
            })?;

        let stdout = forward(child.stdout.take(), OutputStream::Stdout, lines.clone());
        let stderr = forward(child.stderr.take(), OutputStream::Stderr, lines);
        let (status, _, _) = tokio::join!(child.wait(), stdout, stderr);

        let status = status.map_err(|e| Error::Connection {
            host: self.host.clone(),
            reason: format!("lost shell process: {}", e),
        })?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

async fn forward<R>(reader: Option<R>, stream: OutputStream, lines: LineSender)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buffer = LineBuffer::default();
    let mut chunk = [0u8; 8192];
    // Drain to EOF whatever the bytes are; closing the pipe early would
    // SIGPIPE the shell and turn its output into its exit status.
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for text in buffer.push(&chunk[..n]) {
            // Receiver may be gone if the caller stopped listening; keep draining.
            let _ = lines.send(OutputLine { stream, text });
        }
    }
    if let Some(text) = buffer.finish() {
        let _ = lines.send(OutputLine { stream, text });
    }
}

fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", source.display()),
        ));
    }

    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
