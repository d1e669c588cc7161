use super::{parse_duration_string, Config, GroupConfig, RemoteTarget, CONFIG_VERSION};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(Error::Validation(format!(
                "Unsupported config version {} (this release reads version {})",
                self.version, CONFIG_VERSION
            )));
        }

        for (name, group) in &self.groups {
            let mut seen = HashSet::new();
            for (index, remote) in group.remotes.iter().enumerate() {
                if remote.host.trim().is_empty() {
                    return Err(Error::Validation(format!(
                        "groups.{}.remotes[{}] has an empty host",
                        name, index
                    )));
                }
                if remote.username.trim().is_empty() {
                    return Err(Error::Validation(format!(
                        "groups.{}.remotes[{}] ({}) has an empty username",
                        name, index, remote.host
                    )));
                }
                if remote.port == 0 {
                    return Err(Error::Validation(format!(
                        "groups.{}.remotes[{}] ({}) has port 0",
                        name, index, remote.host
                    )));
                }
                if !seen.insert(remote.id()) {
                    return Err(Error::Validation(format!(
                        "groups.{} lists {} more than once",
                        name,
                        remote.id()
                    )));
                }
                if remote.password.as_ref().map_or(true, |p| p.is_empty())
                    && remote.identity_file.is_none()
                {
                    tracing::warn!(
                        "groups.{}: {} has no password or identity_file, falling back to ssh-agent",
                        name,
                        remote.id()
                    );
                }
            }
        }

        if let Some(ref timeout) = self.transport.connect_timeout {
            if parse_duration_string(timeout).is_none() {
                return Err(Error::Validation(format!(
                    "transport.connect_timeout '{}' is invalid. Use formats like '10s', '1m', '500ms'",
                    timeout
                )));
            }
        }

        if let Some(ref service) = self.service {
            if service.name.trim().is_empty() {
                return Err(Error::Validation("service.name must not be empty".to_string()));
            }
            if !self.groups.contains_key(&service.group) {
                return Err(Error::Validation(format!(
                    "service.group references non-existent group '{}'",
                    service.group
                )));
            }
        }

        Ok(())
    }

    /// Effective connect timeout for the transport.
    pub fn connect_timeout(&self) -> Duration {
        self.transport
            .connect_timeout
            .as_deref()
            .and_then(parse_duration_string)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT)
    }

    /// Replace the first remote of `group` (creating the group if needed).
    ///
    /// Extra fields already present on the replaced remote are kept unless
    /// the new target sets them.
    pub fn upsert_primary_remote(&mut self, group: &str, mut target: RemoteTarget) {
        let entry = self
            .groups
            .entry(group.to_string())
            .or_insert_with(GroupConfig::default);

        match entry.remotes.first_mut() {
            Some(existing) => {
                for (key, value) in &existing.extra {
                    target
                        .extra
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                *existing = target;
            }
            None => entry.remotes.push(target),
        }
    }
}
