// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(rdeploy::config::validation),
        help("Run `rdeploy validate` for detailed validation errors")
    )]
    Validation(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown task '{0}'")]
    #[diagnostic(
        code(rdeploy::task::unknown),
        help("List the available tasks with `rdeploy tasks`")
    )]
    UnknownTask(String),

    #[error("Remote group '{0}' is not configured")]
    #[diagnostic(
        code(rdeploy::group::not_found),
        help("Declare the group under 'groups:' in remote-deploy.yaml")
    )]
    GroupNotFound(String),

    #[error("Remote group '{0}' has no remotes")]
    #[diagnostic(
        code(rdeploy::group::empty),
        help("Add at least one entry to groups.{0}.remotes")
    )]
    EmptyGroup(String),

    #[error("Connection to {host} failed: {reason}")]
    #[diagnostic(
        code(rdeploy::remote::connection),
        help("Check that {host} is reachable and the credentials are correct")
    )]
    Connection { host: String, reason: String },

    #[error("Transfer to {host} failed: {reason}")]
    #[diagnostic(code(rdeploy::remote::transfer))]
    Transfer { host: String, reason: String },

    #[error("Command batch on {host} exited with status {exit_code}")]
    #[diagnostic(code(rdeploy::remote::command))]
    Command { host: String, exit_code: i32 },

    #[error("Task '{task}' failed:\n{}", .failures.iter().map(|f| format!("  - {}", f)).collect::<Vec<_>>().join("\n"))]
    #[diagnostic(code(rdeploy::task::failed))]
    Aggregation { task: String, failures: Vec<String> },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors that are detected before any connection is attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::Parse(_)
                | Error::Validation(_)
                | Error::Yaml(_)
                | Error::UnknownTask(_)
                | Error::GroupNotFound(_)
                | Error::EmptyGroup(_)
        )
    }

    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::UnknownTask(_) => {
                Some("Run `rdeploy tasks` to see the registered task names and aliases.".to_string())
            }
            Error::GroupNotFound(name) => Some(format!(
                "Add a '{}' entry under 'groups:' in remote-deploy.yaml, or set one with `rdeploy configure {} --host <ip> --username <user>`.",
                name, name
            )),
            Error::EmptyGroup(name) => Some(format!(
                "Group '{}' exists but lists no remotes. Add one with `rdeploy configure {} --host <ip> --username <user>`.",
                name, name
            )),
            Error::Config(msg) if msg.contains("Could not find") => Some(
                "Create remote-deploy.yaml in the project root or pass --config <path>.".to_string(),
            ),
            Error::Config(_) | Error::Validation(_) | Error::Parse(_) | Error::Yaml(_) => {
                Some("Validate your config with: rdeploy validate".to_string())
            }
            Error::Connection { host, .. } => Some(format!(
                "Verify that {} accepts SSH connections and that the username/password in remote-deploy.yaml are current.",
                host
            )),
            Error::Aggregation { .. } => Some(
                "Nothing is retried automatically. Fix the failing hosts and run the task again.".to_string(),
            ),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}
