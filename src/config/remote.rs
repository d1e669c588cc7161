//! Remote target and group configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A credential value that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Connection descriptor for one remote host.
///
/// Identity is the `(host, port)` pair. The same host may appear in
/// several groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTarget {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,

    /// Private key used instead of (or before) the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,

    /// Protocol-specific fields such as a broker `vhost`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

fn default_port() -> u16 {
    22
}

impl RemoteTarget {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: username.into(),
            password: None,
            identity_file: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Secret::new(password));
        self
    }

    pub fn id(&self) -> TargetId {
        TargetId {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// `(host, port)` identity of a target, displayed as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One entry under `groups:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default)]
    pub remotes: Vec<RemoteTarget>,

    /// Remote directory the group's artifacts are deployed under.
    #[serde(default = "default_base_path", alias = "basePath")]
    pub base_path: String,
}

fn default_base_path() -> String {
    "/".to_string()
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            remotes: Vec::new(),
            base_path: default_base_path(),
        }
    }
}

impl GroupConfig {
    /// Join a file or directory name onto the base path with exactly one `/`.
    pub fn remote_path(&self, name: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            if base.is_empty() {
                "/".to_string()
            } else {
                base.to_string()
            }
        } else {
            format!("{}/{}", base, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug() {
        let target = RemoteTarget::new("10.0.0.5", "root").with_password("hunter2");
        let debug = format!("{:?}", target);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("Secret(***)"));
    }

    #[test]
    fn extra_fields_are_collected() {
        let yaml = r#"
host: 10.0.0.9
username: guest
password: guest
vhost: sixsense
"#;
        let target: RemoteTarget = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(target.port, 22);
        assert_eq!(target.extra.get("vhost").map(String::as_str), Some("sixsense"));
        assert_eq!(target.password.as_ref().map(Secret::expose), Some("guest"));
    }

    #[test]
    fn remote_path_joins_cleanly() {
        let group = GroupConfig {
            remotes: vec![],
            base_path: "/sixsense/".into(),
        };
        assert_eq!(group.remote_path("OperationEngine.jar"), "/sixsense/OperationEngine.jar");
        assert_eq!(group.remote_path(""), "/sixsense");

        let root = GroupConfig::default();
        assert_eq!(root.remote_path("tmp"), "/tmp");
        assert_eq!(root.remote_path(""), "/");
    }

    #[test]
    fn target_id_display() {
        let id = RemoteTarget::new("engine-1", "root").with_port(2222).id();
        assert_eq!(id.to_string(), "engine-1:2222");
    }
}
