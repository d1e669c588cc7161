//! # Remote Deploy
//!
//! Push build artifacts and shell command batches to named groups of remote
//! hosts, in parallel, optionally bracketed by a remote service stop/start.
//!
//! ## Features
//!
//! - **Remote groups**: Named lists of SSH targets loaded from `remote-deploy.yaml`
//! - **Parallel fan-out**: Every operation runs on all targets of a group at once
//!   and waits for all of them; one failing host never cancels the others
//! - **Command batches**: Commands chained with `&&`, output streamed per host
//! - **Service lifecycle**: Stop, deploy, start with a configurable restart policy
//! - **Tasks**: Named workflows (`all`, `jar`, `dependencies`, ...) resolved before
//!   any connection is opened
//!
//! ## Quick Start
//!
//! ```no_run
//! use remote_deploy::{Dispatcher, Orchestrator, Parser, TaskCatalog};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), remote_deploy::Error> {
//! let config = Parser::new().load_config("remote-deploy.yaml")?;
//! let catalog = TaskCatalog::from_config(&config, Path::new("."), None);
//!
//! let orchestrator = Orchestrator::builder().config(config).build()?;
//! let report = Dispatcher::new(&orchestrator, &catalog).dispatch("jar").await?;
//! assert!(report.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, GroupConfig, Parser, RemoteTarget, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use orchestrator::{
    AggregateOutcome, CommandBatch, Dispatcher, Orchestrator, RestartPolicy, Step, TaskCatalog,
    TransferJob, WorkflowReport, DEFAULT_TASK,
};
pub use registry::{Registry, RemoteGroup};
pub use transport::{LocalTransport, SshTransport, Transport};
