use super::Orchestrator;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{CliOutput, UserOutput};
use crate::registry::Registry;
use crate::transport::{self, Transport};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for constructing an `Orchestrator` with a fluent API.
///
/// The registry comes either from a validated [`Config`] or is supplied
/// directly. The transport defaults to the one selected in the config.
///
/// # Example
///
/// ```no_run
/// use remote_deploy::{Config, Orchestrator};
/// use std::path::PathBuf;
///
/// # fn example() -> Result<(), remote_deploy::Error> {
/// let config = Config::default();
/// let orchestrator = Orchestrator::builder()
///     .config(config)
///     .work_dir(PathBuf::from("."))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct OrchestratorBuilder {
    config: Option<Config>,
    registry: Option<Registry>,
    transport: Option<Arc<dyn Transport>>,
    output: Option<Arc<dyn UserOutput>>,
    work_dir: Option<PathBuf>,
}

impl OrchestratorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: None,
            registry: None,
            transport: None,
            output: None,
            work_dir: None,
        }
    }

    /// Set the configuration. It is validated in [`build`](Self::build).
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an explicit registry instead of one derived from the config.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the transport selected by the config.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where progress and remote output go. Defaults to [`CliOutput`].
    pub fn output(mut self, output: Arc<dyn UserOutput>) -> Self {
        self.output = Some(output);
        self
    }

    /// Project root used to resolve the local transport root.
    ///
    /// If not set, defaults to the current directory (".").
    pub fn work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        if let Some(ref config) = self.config {
            config.validate()?;
        }

        let registry = match (self.registry, &self.config) {
            (Some(registry), _) => registry,
            (None, Some(config)) => Registry::from_config(config),
            (None, None) => {
                return Err(Error::Config(
                    "Orchestrator needs either a config or a registry".to_string(),
                ))
            }
        };

        let transport = match (self.transport, &self.config) {
            (Some(transport), _) => transport,
            (None, Some(config)) => {
                let work_dir = self.work_dir.unwrap_or_else(|| PathBuf::from("."));
                transport::from_config(config, &work_dir)
            }
            (None, None) => {
                return Err(Error::Config(
                    "Orchestrator needs a transport when built without a config".to_string(),
                ))
            }
        };

        let output = self.output.unwrap_or_else(|| Arc::new(CliOutput));

        Ok(Orchestrator::new(Arc::new(registry), transport, output))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
