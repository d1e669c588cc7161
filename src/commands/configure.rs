use remote_deploy::output::UserOutput;
use remote_deploy::{Config, Parser as ConfigParser, RemoteTarget, CONFIG_FILE_NAME};
use std::path::PathBuf;

/// Write `target` as the primary remote of `group`.
///
/// Starts from an empty configuration when no file exists yet. The result
/// is validated before it replaces the file on disk.
pub fn run_configure(
    config_path: Option<PathBuf>,
    group: &str,
    target: RemoteTarget,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let parser = ConfigParser::new();
    let config_path = match config_path {
        Some(path) => path,
        None => parser
            .find_config_file()
            .or_else(|_| std::env::current_dir().map(|dir| dir.join(CONFIG_FILE_NAME)))?,
    };

    let mut config = if config_path.exists() {
        parser.load_config(&config_path)?
    } else {
        out.status(&format!("Creating {}", config_path.display()));
        Config::default()
    };

    let id = target.id();
    config.upsert_primary_remote(group, target);
    config.validate()?;
    parser.save_config(&config, &config_path)?;

    out.success(&format!(
        "Set primary remote of group '{}' to {} in {}",
        group,
        id,
        config_path.display()
    ));
    Ok(())
}

/// Split repeated `key=value` arguments.
pub fn parse_extra(pairs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(anyhow::anyhow!(
                "Invalid extra field '{}'. Expected KEY=VALUE",
                pair
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extra_splits_on_first_equals() {
        let parsed = parse_extra(&["role=primary".to_string(), "tag=a=b".to_string()]).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("role".to_string(), "primary".to_string()),
                ("tag".to_string(), "a=b".to_string())
            ]
        );
        assert!(parse_extra(&["novalue".to_string()]).is_err());
    }
}
