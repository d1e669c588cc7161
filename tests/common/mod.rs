#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use remote_deploy::config::RemoteTarget;
use remote_deploy::output::UserOutput;
use remote_deploy::transport::{LineSender, LocalTransport, OutputStream, RemoteSession, Transport};
use remote_deploy::{Error, Registry, RemoteGroup, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records everything written through `UserOutput`.
#[derive(Default)]
pub struct RecordingOutput {
    lines: Mutex<Vec<String>>,
}

impl RecordingOutput {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }
}

impl UserOutput for RecordingOutput {
    fn status(&self, message: &str) {
        self.push(message.to_string());
    }
    fn success(&self, message: &str) {
        self.push(message.to_string());
    }
    fn warning(&self, message: &str) {
        self.push(format!("warning: {}", message));
    }
    fn error(&self, message: &str) {
        self.push(format!("error: {}", message));
    }
    fn remote_line(&self, host: &str, stream: OutputStream, line: &str) {
        self.push(format!("[{} | {}]# {}", host, stream, line));
    }
    fn blank(&self) {}
}

/// Local transport with injectable connection failures and delays, and an
/// ordered log of what every session did.
pub struct ScriptedTransport {
    inner: LocalTransport,
    connects: AtomicUsize,
    refuse: HashSet<String>,
    delays: HashMap<String, Duration>,
    drop_on_run: Arc<HashSet<String>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalTransport::new(root),
            connects: AtomicUsize::new(0),
            refuse: HashSet::new(),
            delays: HashMap::new(),
            drop_on_run: Arc::new(HashSet::new()),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Connections to `host` fail.
    pub fn refuse(mut self, host: &str) -> Self {
        self.refuse.insert(host.to_string());
        self
    }

    /// Connections to `host` take `delay` before completing.
    pub fn delay(mut self, host: &str, delay: Duration) -> Self {
        self.delays.insert(host.to_string(), delay);
        self
    }

    /// Sessions to `host` connect, then lose the connection on `run`.
    pub fn fail_run(mut self, host: &str) -> Self {
        let mut hosts = (*self.drop_on_run).clone();
        hosts.insert(host.to_string());
        self.drop_on_run = Arc::new(hosts);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn local(&self) -> &LocalTransport {
        &self.inner
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&target.host) {
            tokio::time::sleep(*delay).await;
        }
        if self.refuse.contains(&target.host) {
            self.events.lock().push(format!("refused {}", target.host));
            return Err(Error::Connection {
                host: target.host.clone(),
                reason: "connection refused".to_string(),
            });
        }
        let inner = self.inner.connect(target).await?;
        Ok(Box::new(ScriptedSession {
            host: target.host.clone(),
            inner,
            drop_on_run: self.drop_on_run.clone(),
            events: self.events.clone(),
        }))
    }
}

struct ScriptedSession {
    host: String,
    inner: Box<dyn RemoteSession>,
    drop_on_run: Arc<HashSet<String>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    fn log(&self, event: String) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn put_file(&mut self, source: &Path, destination: &str) -> Result<()> {
        self.log(format!("put {} {}", self.host, destination));
        self.inner.put_file(source, destination).await
    }

    async fn put_dir(&mut self, source: &Path, destination: &str) -> Result<()> {
        self.log(format!("put-dir {} {}", self.host, destination));
        self.inner.put_dir(source, destination).await
    }

    async fn run(&mut self, command: &str, lines: LineSender) -> Result<i32> {
        self.log(format!("run {} {}", self.host, command));
        if self.drop_on_run.contains(&self.host) {
            return Err(Error::Connection {
                host: self.host.clone(),
                reason: "channel closed by peer".to_string(),
            });
        }
        self.inner.run(command, lines).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log(format!("close {}", self.host));
        self.inner.close().await
    }
}

pub fn target(host: &str) -> RemoteTarget {
    RemoteTarget::new(host, "root").with_password("secret")
}

pub fn group(name: &str, hosts: &[&str]) -> RemoteGroup {
    RemoteGroup::new(name, "/", hosts.iter().map(|h| target(h)).collect::<Vec<_>>())
}

pub fn registry(groups: Vec<RemoteGroup>) -> Registry {
    Registry::from_groups(groups)
}
