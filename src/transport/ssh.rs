use super::{LineBuffer, LineSender, OutputLine, RemoteSession, Transport};
use crate::config::RemoteTarget;
use crate::error::{Error, Result};
use async_trait::async_trait;
use ssh2::{OpenFlags, OpenType, Session, Sftp};
use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Password / key authenticated SSH + SFTP transport built on `ssh2`.
///
/// `ssh2` is blocking, so every session operation runs on tokio's blocking
/// pool; the fan-out above it stays cooperative.
#[derive(Debug, Clone)]
pub struct SshTransport {
    connect_timeout: Duration,
}

impl SshTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>> {
        let owned = target.clone();
        let timeout = self.connect_timeout;
        let session = tokio::task::spawn_blocking(move || open_session(&owned, timeout))
            .await
            .map_err(|e| Error::Connection {
                host: target.host.clone(),
                reason: format!("connect task failed: {}", e),
            })??;

        tracing::debug!("SSH session established with {}", target.id());
        Ok(Box::new(SshSession {
            host: target.host.clone(),
            session,
        }))
    }
}

fn open_session(target: &RemoteTarget, timeout: Duration) -> Result<Session> {
    let connection_error = |reason: String| Error::Connection {
        host: target.host.clone(),
        reason,
    };

    let addr = (target.host.as_str(), target.port)
        .to_socket_addrs()
        .map_err(|e| connection_error(format!("cannot resolve address: {}", e)))?
        .next()
        .ok_or_else(|| connection_error("address resolved to nothing".to_string()))?;
    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| connection_error(format!("TCP connect to {} failed: {}", addr, e)))?;
    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session =
        Session::new().map_err(|e| connection_error(format!("cannot create session: {}", e)))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
    session
        .handshake()
        .map_err(|e| connection_error(format!("handshake failed: {}", e)))?;

    let mut attempts: Vec<String> = Vec::new();
    if let Some(ref key) = target.identity_file {
        if let Err(e) = session.userauth_pubkey_file(&target.username, None, key, None) {
            attempts.push(format!("key {}: {}", key.display(), e));
        }
    }
    if !session.authenticated() {
        if let Some(ref password) = target.password {
            if let Err(e) = session.userauth_password(&target.username, password.expose()) {
                attempts.push(format!("password: {}", e));
            }
        }
    }
    // Agent is the last resort, also when a configured credential was refused.
    if !session.authenticated() {
        if let Err(e) = session.userauth_agent(&target.username) {
            attempts.push(format!("agent: {}", e));
        }
    }
    if !session.authenticated() {
        return Err(connection_error(format!(
            "authentication failed for {}: {}",
            target.username,
            attempts.join("; ")
        )));
    }

    // Session I/O after login is bounded by the remote command itself.
    session.set_timeout(0);
    Ok(session)
}

struct SshSession {
    host: String,
    session: Session,
}

impl SshSession {
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Session, String) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let session = self.session.clone();
        let host = self.host.clone();
        tokio::task::spawn_blocking(move || op(session, host))
            .await
            .map_err(|e| Error::Connection {
                host: self.host.clone(),
                reason: format!("session task failed: {}", e),
            })?
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn put_file(&mut self, source: &Path, destination: &str) -> Result<()> {
        let source = source.to_path_buf();
        let destination = destination.to_string();
        self.blocking(move |session, host| {
            let sftp = session.sftp().map_err(|e| Error::Connection {
                host: host.clone(),
                reason: format!("cannot open SFTP channel: {}", e),
            })?;
            let remote = Path::new(&destination);
            if let Some(parent) = remote.parent() {
                ensure_remote_dir(&sftp, parent);
            }
            upload(&sftp, &source, remote).map_err(|e| Error::Transfer {
                host,
                reason: format!("{} -> {}: {}", source.display(), destination, e),
            })
        })
        .await
    }

    async fn put_dir(&mut self, source: &Path, destination: &str) -> Result<()> {
        let source = source.to_path_buf();
        let destination = destination.to_string();
        self.blocking(move |session, host| {
            let sftp = session.sftp().map_err(|e| Error::Connection {
                host: host.clone(),
                reason: format!("cannot open SFTP channel: {}", e),
            })?;
            upload_tree(&sftp, &source, Path::new(&destination)).map_err(|e| Error::Transfer {
                host,
                reason: format!("{} -> {}: {}", source.display(), destination, e),
            })
        })
        .await
    }

    async fn run(&mut self, command: &str, lines: LineSender) -> Result<i32> {
        let command = command.to_string();
        self.blocking(move |session, host| {
            exec_streaming(&session, &command, &lines).map_err(|e| Error::Connection {
                host,
                reason: format!("command channel failed: {}", e),
            })
        })
        .await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let host = self.host.clone();
        self.blocking(move |session, host| {
            session
                .disconnect(None, "deployment finished", None)
                .map_err(|e| Error::Connection {
                    host,
                    reason: format!("disconnect failed: {}", e),
                })
        })
        .await?;
        tracing::debug!("SSH session with {} closed", host);
        Ok(())
    }
}

fn upload(sftp: &Sftp, source: &Path, remote: &Path) -> io::Result<()> {
    let mut local = std::fs::File::open(source)?;
    let mut file = sftp
        .open_mode(
            remote,
            OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            0o644,
            OpenType::File,
        )
        .map_err(io::Error::from)?;
    io::copy(&mut local, &mut file)?;
    Ok(())
}

fn upload_tree(sftp: &Sftp, source: &Path, destination: &Path) -> io::Result<()> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", source.display()),
        ));
    }

    ensure_remote_dir(sftp, destination);
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let remote = remote_join(destination, relative);
        if entry.file_type().is_dir() {
            if sftp.stat(&remote).is_err() {
                sftp.mkdir(&remote, 0o755).map_err(io::Error::from)?;
            }
        } else {
            upload(sftp, entry.path(), &remote)?;
        }
    }
    Ok(())
}

/// Join with `/` regardless of the local platform's separator.
fn remote_join(base: &Path, relative: &Path) -> PathBuf {
    let mut joined = base.to_string_lossy().trim_end_matches('/').to_string();
    for part in relative.components() {
        joined.push('/');
        joined.push_str(&part.as_os_str().to_string_lossy());
    }
    PathBuf::from(joined)
}

/// Create every missing directory along `dir`. Failures are left for the
/// following write to report.
fn ensure_remote_dir(sftp: &Sftp, dir: &Path) {
    let mut current = PathBuf::new();
    for part in dir.components() {
        current.push(part);
        if current.as_os_str().is_empty() || sftp.stat(&current).is_ok() {
            continue;
        }
        let _ = sftp.mkdir(&current, 0o755);
    }
}

/// Run `command` on a fresh channel, pumping stdout and stderr without
/// letting either pipe fill up and stall the other.
fn exec_streaming(session: &Session, command: &str, lines: &LineSender) -> io::Result<i32> {
    let mut channel = session.channel_session().map_err(io::Error::from)?;
    channel.exec(command).map_err(io::Error::from)?;

    let mut stdout = LineBuffer::default();
    let mut stderr = LineBuffer::default();
    let mut buf = [0u8; 8192];

    session.set_blocking(false);
    let pumped = (|| -> io::Result<()> {
        loop {
            let mut progressed = false;

            match channel.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    progressed = true;
                    for line in stdout.push(&buf[..n]) {
                        let _ = lines.send(OutputLine::stdout(line));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }

            match channel.stderr().read(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    progressed = true;
                    for line in stderr.push(&buf[..n]) {
                        let _ = lines.send(OutputLine::stderr(line));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }

            if !progressed {
                if channel.eof() {
                    return Ok(());
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    })();
    session.set_blocking(true);
    pumped?;

    if let Some(line) = stdout.finish() {
        let _ = lines.send(OutputLine::stdout(line));
    }
    if let Some(line) = stderr.finish() {
        let _ = lines.send(OutputLine::stderr(line));
    }

    channel.wait_close().map_err(io::Error::from)?;
    let status = channel.exit_status().map_err(io::Error::from)?;
    let signal = channel
        .exit_signal()
        .map_err(io::Error::from)?
        .exit_signal;
    Ok(exit_code(status, signal.as_deref()))
}

/// libssh2 reports status 0 when the remote process died from a signal
/// (it sent `exit-signal`, not `exit-status`); such a run never succeeds.
fn exit_code(status: i32, signal: Option<&str>) -> i32 {
    match signal {
        Some(name) if !name.is_empty() => {
            tracing::debug!("Remote command killed by signal {}", name);
            if status == 0 {
                -1
            } else {
                status
            }
        }
        _ => status,
    }
}
