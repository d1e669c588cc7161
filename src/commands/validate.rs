use remote_deploy::output::UserOutput;
use remote_deploy::{Parser as ConfigParser, CONFIG_FILE_NAME};
use std::path::PathBuf;

pub fn run_validate(config_path: Option<PathBuf>, out: &dyn UserOutput) -> anyhow::Result<()> {
    let parser = ConfigParser::new();
    let config_path = if let Some(path) = config_path {
        path
    } else {
        match parser.find_config_file() {
            Ok(path) => path,
            Err(_) => {
                out.error("Error: No configuration file found");
                out.status(&format!(
                    "\nSearched for {} in:\n  - Current directory: {}\n  - Parent directories up to root",
                    CONFIG_FILE_NAME,
                    std::env::current_dir()?.display()
                ));
                out.status("\nHint: Run 'rdeploy configure <group> --host <host> -u <user>' to create one");
                return Err(anyhow::anyhow!("Configuration file not found"));
            }
        }
    };

    out.status(&format!("Validating {}...", config_path.display()));

    let config = match parser.load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            out.error("Configuration failed to load");
            return Err(e.into());
        }
    };

    config.validate()?;

    out.success("Configuration is valid");
    out.blank();

    out.status(&format!("Groups: {}", config.groups.len()));
    for (name, group) in &config.groups {
        out.status(&format!(
            "  - {} ({} remote(s), base path {})",
            name,
            group.remotes.len(),
            group.base_path
        ));
        for remote in &group.remotes {
            out.status(&format!("      {}@{}", remote.username, remote.id()));
        }
    }

    if let Some(ref service) = config.service {
        out.status(&format!(
            "\nService: {} on group '{}' (restart policy {})",
            service.name, service.group, service.restart_policy
        ));
    }

    out.status(&format!(
        "\nTransport: {:?}, connect timeout {:?}",
        config.transport.kind,
        config.connect_timeout()
    ));

    Ok(())
}
