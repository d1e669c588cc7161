//! Read-only lookup of remote groups by role.
//!
//! The registry is built once from [`Config`] before any workflow starts and
//! is shared by every concurrent fan-out; nothing mutates it afterwards.

use crate::config::{Config, RemoteTarget};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named set of targets. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct RemoteGroup {
    name: String,
    base_path: String,
    targets: Arc<[RemoteTarget]>,
}

impl RemoteGroup {
    pub fn new(
        name: impl Into<String>,
        base_path: impl Into<String>,
        targets: Vec<RemoteTarget>,
    ) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            targets: targets.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn targets(&self) -> &[RemoteTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    groups: BTreeMap<String, RemoteGroup>,
}

impl Registry {
    pub fn from_config(config: &Config) -> Self {
        let groups = config
            .groups
            .iter()
            .map(|(name, group)| {
                (
                    name.clone(),
                    RemoteGroup::new(name.clone(), group.base_path.clone(), group.remotes.clone()),
                )
            })
            .collect();
        Self { groups }
    }

    pub fn from_groups(groups: impl IntoIterator<Item = RemoteGroup>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .map(|g| (g.name.clone(), g))
                .collect(),
        }
    }

    /// Look up a group that a workflow is about to fan out to.
    ///
    /// Missing and empty groups are both configuration errors.
    pub fn group(&self, name: &str) -> Result<&RemoteGroup> {
        let group = self
            .groups
            .get(name)
            .ok_or_else(|| Error::GroupNotFound(name.to_string()))?;
        if group.is_empty() {
            return Err(Error::EmptyGroup(name.to_string()));
        }
        Ok(group)
    }

    /// Verify every named group before any connection is opened.
    pub fn check_groups<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.group(name)?;
        }
        Ok(())
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::from_groups([
            RemoteGroup::new(
                "engine",
                "/sixsense",
                vec![
                    RemoteTarget::new("10.0.0.1", "root"),
                    RemoteTarget::new("10.0.0.2", "root"),
                ],
            ),
            RemoteGroup::new("rabbit", "/", vec![]),
        ])
    }

    #[test]
    fn lookup_existing_group() {
        let registry = registry();
        let group = registry.group("engine").unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.base_path(), "/sixsense");
    }

    #[test]
    fn missing_and_empty_groups_fail() {
        let registry = registry();
        assert!(matches!(registry.group("ansible"), Err(Error::GroupNotFound(_))));
        assert!(matches!(registry.group("rabbit"), Err(Error::EmptyGroup(_))));
        assert!(registry.check_groups(["engine", "rabbit"]).is_err());
        assert!(registry.check_groups(["engine"]).is_ok());
    }

    #[test]
    fn built_from_config() {
        let config: Config = serde_yaml::from_str(
            r#"
groups:
  ansible:
    base_path: /ansible
    remotes:
      - host: 10.0.0.4
        username: root
"#,
        )
        .unwrap();
        let registry = Registry::from_config(&config);
        assert_eq!(registry.group("ansible").unwrap().targets()[0].host, "10.0.0.4");
        assert_eq!(registry.group_names().collect::<Vec<_>>(), vec!["ansible"]);
    }
}
