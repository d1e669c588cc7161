//! Core configuration types.
//!
//! This module contains the root [`Config`] struct and the sections that
//! describe local artifacts, the optional remote service and the transport.

use super::GroupConfig;
use crate::orchestrator::RestartPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Schema version written by this release.
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure for remote-deploy.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Remote groups keyed by role (e.g. `engine`, `ansible`, `rabbit`).
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,

    #[serde(default)]
    pub artifacts: Artifacts,

    /// Remote service bracketed by stop/start around deploy tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            groups: BTreeMap::new(),
            artifacts: Artifacts::default(),
            service: None,
            transport: TransportConfig::default(),
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Local paths of the build outputs, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Artifacts {
    pub jar: String,
    pub tests_jar: String,
    pub dependencies: String,
    pub control_dir: String,
}

impl Default for Artifacts {
    fn default() -> Self {
        Self {
            jar: "target/OperationEngine.jar".to_string(),
            tests_jar: "target/OperationEngine-tests.jar".to_string(),
            dependencies: "target/dependency-jars".to_string(),
            control_dir: "dev_env/ansible_control".to_string(),
        }
    }
}

impl Artifacts {
    /// Resolve an artifact path against the project root. Absolute paths
    /// are kept as they are.
    pub fn resolve(root: &Path, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// Remote service managed around deploy tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Name passed to `service <name> stop|start`.
    pub name: String,

    /// Group the service runs on.
    #[serde(default = "default_service_group")]
    pub group: String,

    #[serde(default)]
    pub restart_policy: RestartPolicy,

    /// Overrides the default stop batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    /// Overrides the default start batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start: Vec<String>,
}

fn default_service_group() -> String {
    "engine".to_string()
}

impl ServiceConfig {
    pub fn stop_commands(&self) -> Vec<String> {
        if !self.stop.is_empty() {
            return self.stop.clone();
        }
        vec![
            format!("service {} stop", self.name),
            format!("echo \"{} service has stopped\"", self.name),
        ]
    }

    pub fn start_commands(&self) -> Vec<String> {
        if !self.start.is_empty() {
            return self.start.clone();
        }
        vec![
            format!("service {} start", self.name),
            format!("echo \"{} service has started\"", self.name),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Ssh,
    /// Maps every target onto a directory under `local_root`.
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,

    /// TCP connect and session I/O timeout, e.g. "30s". Defaults to 30 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,

    /// Root directory for the local transport, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_root: Option<String>,
}
