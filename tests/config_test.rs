mod common;

use common::RecordingOutput;
use remote_deploy::{Config, Dispatcher, Orchestrator, Parser, RemoteTarget, TaskCatalog};
use std::sync::Arc;

#[test]
fn configure_write_back_keeps_other_groups_and_extras() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remote-deploy.yaml");
    std::fs::write(
        &path,
        r#"
version: 1
groups:
  engine:
    basePath: /sixsense
    remotes:
      - host: 10.0.0.1
        username: root
        password: old
        datacenter: east
  ansible:
    remotes:
      - host: 10.0.0.9
        username: admin
        password: pw
"#,
    )
    .unwrap();

    let parser = Parser::new();
    let mut config = parser.load_config(&path).unwrap();
    config.upsert_primary_remote(
        "engine",
        RemoteTarget::new("10.0.0.5", "deploy").with_password("new"),
    );
    config.validate().unwrap();
    parser.save_config(&config, &path).unwrap();

    let reloaded = parser.load_config(&path).unwrap();
    let engine = &reloaded.groups["engine"];
    assert_eq!(engine.base_path, "/sixsense");
    assert_eq!(engine.remotes.len(), 1);
    assert_eq!(engine.remotes[0].host, "10.0.0.5");
    assert_eq!(engine.remotes[0].username, "deploy");
    assert_eq!(
        engine.remotes[0].password.as_ref().map(|p| p.expose()),
        Some("new")
    );
    assert_eq!(engine.remotes[0].extra.get("datacenter").map(String::as_str), Some("east"));
    assert_eq!(reloaded.groups["ansible"].remotes[0].host, "10.0.0.9");
    assert!(!dir.path().join("remote-deploy.yaml.tmp").exists());
}

#[test]
fn config_is_found_from_a_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("remote-deploy.yaml"), "groups: {}\n").unwrap();
    let nested = dir.path().join("a/b");
    std::fs::create_dir_all(&nested).unwrap();

    let found = Parser::find_config_in_dir(&nested).unwrap();
    assert_eq!(found, dir.path().join("remote-deploy.yaml"));
}

#[test]
fn secrets_stay_out_of_debug_output() {
    let target = RemoteTarget::new("10.0.0.1", "root").with_password("hunter2");
    let rendered = format!("{:?}", target);
    assert!(!rendered.contains("hunter2"));
}

#[tokio::test]
async fn local_transport_from_config_runs_a_task() {
    let project = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(project.path().join("target")).unwrap();
    std::fs::write(project.path().join("target/OperationEngine.jar"), b"engine").unwrap();

    let config: Config = Parser::new()
        .parse_config(
            r#"
groups:
  engine:
    base_path: /sixsense
    remotes:
      - host: node-1
        username: root
transport:
  kind: local
  local_root: sandbox
"#,
        )
        .unwrap();

    let catalog = TaskCatalog::from_config(&config, project.path(), None);
    let output = Arc::new(RecordingOutput::default());
    let orchestrator = Orchestrator::builder()
        .config(config)
        .work_dir(project.path().to_path_buf())
        .output(output.clone())
        .build()
        .unwrap();

    Dispatcher::new(&orchestrator, &catalog)
        .dispatch("jar")
        .await
        .unwrap();

    let landed = project
        .path()
        .join("sandbox/node-1_22/sixsense/OperationEngine.jar");
    assert_eq!(std::fs::read(landed).unwrap(), b"engine");
    assert!(output.contains("[node-1 | stdout]# finished uploading jar"));
}
