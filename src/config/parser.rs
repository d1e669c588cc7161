use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "remote-deploy.yaml";
const ALT_CONFIG_FILE_NAME: &str = "remote-deploy.yml";

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory
    pub fn find_config_file(&self) -> Result<PathBuf> {
        let current_dir = std::env::current_dir()?;
        Self::find_config_in_dir(&current_dir)
    }

    pub fn find_config_in_dir(dir: &Path) -> Result<PathBuf> {
        for name in [CONFIG_FILE_NAME, ALT_CONFIG_FILE_NAME] {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        match dir.parent() {
            Some(parent) => Self::find_config_in_dir(parent),
            None => Err(Error::Config(format!(
                "Could not find {} in current directory or any parent",
                CONFIG_FILE_NAME
            ))),
        }
    }

    /// Load config from file path
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<Config> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_config(&content)
    }

    /// Parse config from YAML string
    pub fn parse_config(&self, content: &str) -> Result<Config> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::Parse(format!("Failed to parse YAML config: {}", e)))
    }

    /// Serialize config back to YAML and replace the file in one rename, so a
    /// crash mid-write never leaves a truncated config behind.
    pub fn save_config<P: AsRef<Path>>(&self, config: &Config, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(config)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Config(format!("Invalid config path '{}'", path.display())))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!("Wrote config to {}", path.display());
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;

    const SAMPLE: &str = r#"
version: 1
groups:
  engine:
    base_path: /sixsense
    remotes:
      - host: 10.0.0.1
        username: root
        password: secret
      - host: 10.0.0.2
        port: 2222
        username: root
        password: secret
  rabbit:
    basePath: /
    remotes:
      - host: 10.0.0.3
        username: guest
        password: guest
        vhost: sixsense
service:
  name: engine
transport:
  kind: ssh
  connect_timeout: 10s
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = Parser::new().parse_config(SAMPLE).unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.groups.len(), 2);
        let engine = &config.groups["engine"];
        assert_eq!(engine.base_path, "/sixsense");
        assert_eq!(engine.remotes[1].port, 2222);
        assert_eq!(
            config.groups["rabbit"].remotes[0].extra.get("vhost").map(String::as_str),
            Some("sixsense")
        );
        let service = config.service.as_ref().unwrap();
        assert_eq!(service.group, "engine");
        assert_eq!(config.transport.kind, TransportKind::Ssh);
        assert_eq!(config.artifacts.jar, "target/OperationEngine.jar");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Parser::new().parse_config("groups: [").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_save_then_load_keeps_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let parser = Parser::new();
        let config = parser.parse_config(SAMPLE).unwrap();

        parser.save_config(&config, &path).unwrap();
        let reloaded = parser.load_config(&path).unwrap();

        assert_eq!(reloaded.groups, config.groups);
        assert_eq!(reloaded.service, config.service);
        assert!(!dir.path().join("remote-deploy.yaml.tmp").exists());
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "version: 1\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Parser::find_config_in_dir(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }
}
