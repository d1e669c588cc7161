use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rdeploy")]
#[command(about = "Remote deploy - push build artifacts to groups of remote hosts")]
pub struct Cli {
    /// Config file path (defaults to remote-deploy.yaml, searched upwards)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root artifacts are resolved against (defaults to the config's directory)
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Task to run (see `rdeploy tasks`)
    #[arg(short, long, default_value = "all")]
    pub task: String,

    /// Print the stages the task would run without connecting to any host
    #[arg(long)]
    pub dry_run: bool,

    /// Override the service restart policy: fail-fast or best-effort-restart
    #[arg(long, value_name = "POLICY")]
    pub restart_policy: Option<String>,

    /// Suppress progress and remote output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the available tasks and their aliases
    Tasks,
    /// Validate configuration without connecting to any host
    Validate,
    /// Set the primary remote of a group and write the config back
    Configure {
        /// Group to update (e.g. engine, ansible)
        group: String,

        /// Remote host name or address
        #[arg(long)]
        host: String,

        /// Login user
        #[arg(short, long)]
        username: String,

        /// Login password. Prefer RDEPLOY_PASSWORD so it stays out of the process list
        #[arg(short, long, env = "RDEPLOY_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// SSH port
        #[arg(long, default_value = "22")]
        port: u16,

        /// Private key used instead of a password
        #[arg(short, long)]
        identity_file: Option<PathBuf>,

        /// Extra key=value fields kept on the remote entry (can be repeated)
        #[arg(short = 'x', long = "extra", value_name = "KEY=VALUE")]
        extra: Vec<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_all_task() {
        let cli = Cli::try_parse_from(["rdeploy"]).unwrap();
        assert_eq!(cli.task, "all");
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn parses_configure_with_extras() {
        let cli = Cli::try_parse_from([
            "rdeploy",
            "configure",
            "engine",
            "--host",
            "10.0.0.5",
            "-u",
            "root",
            "-x",
            "role=primary",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Configure {
                group,
                host,
                port,
                extra,
                ..
            }) => {
                assert_eq!(group, "engine");
                assert_eq!(host, "10.0.0.5");
                assert_eq!(port, 22);
                assert_eq!(extra, vec!["role=primary".to_string()]);
            }
            _ => panic!("expected configure"),
        }
    }

    #[test]
    fn configure_password_can_come_from_env() {
        std::env::set_var("RDEPLOY_PASSWORD", "from-env");
        let cli = Cli::try_parse_from([
            "rdeploy",
            "configure",
            "ansible",
            "--host",
            "10.0.0.9",
            "-u",
            "admin",
        ])
        .unwrap();
        std::env::remove_var("RDEPLOY_PASSWORD");
        match cli.command {
            Some(Commands::Configure { password, .. }) => {
                assert_eq!(password.as_deref(), Some("from-env"));
            }
            _ => panic!("expected configure"),
        }
    }
}
