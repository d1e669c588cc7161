mod cli;
mod commands;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use remote_deploy::output::{CliOutput, QuietOutput, UserOutput};
use remote_deploy::{
    Error as DeployError, Orchestrator, Parser as ConfigParser, RemoteTarget, RestartPolicy,
    TaskCatalog,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(deploy_error) = e.downcast_ref::<DeployError>() {
            eprintln!("Error: {}", deploy_error);
            if let Some(suggestion) = deploy_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let out: Arc<dyn UserOutput> = if cli.quiet {
        Arc::new(QuietOutput)
    } else {
        Arc::new(CliOutput)
    };

    // ── Commands that need no loaded config ─────────────────────────
    match &cli.command {
        Some(Commands::Validate) => {
            return commands::run_validate(cli.config.clone(), out.as_ref());
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        Some(Commands::Configure {
            group,
            host,
            username,
            password,
            port,
            identity_file,
            extra,
        }) => {
            let mut target = RemoteTarget::new(host.clone(), username.clone()).with_port(*port);
            if let Some(password) = password {
                target = target.with_password(password.clone());
            }
            target.identity_file = identity_file.clone();
            target.extra.extend(commands::parse_extra(extra)?);
            return commands::run_configure(cli.config.clone(), group, target, out.as_ref());
        }
        _ => {}
    }

    // ── Load config ─────────────────────────────────────────────────
    let parser = ConfigParser::new();
    let config_path = if let Some(path) = cli.config.clone() {
        path
    } else {
        parser.find_config_file()?
    };
    let config = parser.load_config(&config_path)?;
    config.validate()?;
    let work_dir = resolve_work_dir(cli.workdir.clone(), &config_path)?;

    let mut catalog = TaskCatalog::from_config(&config, &work_dir, Some(&config_path));
    if let Some(ref policy) = cli.restart_policy {
        let policy = policy
            .parse::<RestartPolicy>()
            .map_err(DeployError::Config)?;
        catalog = catalog.with_restart_policy(policy);
    }

    if let Some(Commands::Tasks) = cli.command {
        return commands::run_tasks(&catalog, out.as_ref());
    }

    let orchestrator = Orchestrator::builder()
        .config(config)
        .work_dir(work_dir)
        .output(out.clone())
        .build()?;

    commands::run_deploy(&orchestrator, &catalog, &cli.task, cli.dry_run, out.as_ref()).await
}

/// Resolve the work directory from CLI `--workdir` or the config file's parent directory.
fn resolve_work_dir(workdir: Option<PathBuf>, config_path: &Path) -> anyhow::Result<PathBuf> {
    if let Some(workdir) = workdir {
        return Ok(workdir);
    }
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}

fn init_tracing() {
    // Progress goes through UserOutput; tracing stays quiet unless RUST_LOG asks.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
