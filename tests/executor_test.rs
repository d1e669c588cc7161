mod common;

use common::{group, registry, RecordingOutput, ScriptedTransport};
use remote_deploy::transport::OutputStream;
use remote_deploy::{CommandBatch, Error, Orchestrator};
use std::sync::Arc;

fn orchestrator(
    transport: Arc<ScriptedTransport>,
    output: Arc<RecordingOutput>,
    hosts: &[&str],
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(registry(vec![group("engine", hosts)])),
        transport,
        output,
    )
}

#[tokio::test]
async fn batch_runs_as_one_chained_invocation() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let output = Arc::new(RecordingOutput::default());
    let orchestrator = orchestrator(transport.clone(), output.clone(), &["a"]);

    let batch = CommandBatch::new(["echo one", "echo two"]);
    let aggregate = orchestrator.execute(&batch, "engine").await.unwrap();

    assert!(aggregate.succeeded());
    assert!(transport
        .events()
        .contains(&"run a echo one && echo two".to_string()));
    let captured: Vec<_> = aggregate.outcome_for("a").unwrap().output.iter().map(|l| l.text.clone()).collect();
    assert_eq!(captured, vec!["one", "two"]);
    assert!(output.contains("[a | stdout]# one"));
    assert!(output.contains("[a | stdout]# two"));
}

#[tokio::test]
async fn failing_command_short_circuits_on_that_target_only() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let output = Arc::new(RecordingOutput::default());
    let orchestrator = orchestrator(transport.clone(), output.clone(), &["good", "bad"]);

    let batch = CommandBatch::new([
        "echo first",
        "test \"$REMOTE_HOST\" != bad",
        "echo third",
    ]);
    let aggregate = orchestrator.execute(&batch, "engine").await.unwrap();

    assert!(!aggregate.succeeded());

    let good = aggregate.outcome_for("good").unwrap();
    assert!(good.succeeded);
    let good_lines: Vec<_> = good.output.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(good_lines, vec!["first", "third"]);

    let bad = aggregate.outcome_for("bad").unwrap();
    assert!(!bad.succeeded);
    assert!(matches!(
        bad.error,
        Some(Error::Command { ref host, exit_code: 1 }) if host == "bad"
    ));
    let bad_lines: Vec<_> = bad.output.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(bad_lines, vec!["first"]);
    assert!(!output.contains("[bad | stdout]# third"));
}

#[tokio::test]
async fn stderr_is_attributed_but_does_not_fail() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let output = Arc::new(RecordingOutput::default());
    let orchestrator = orchestrator(transport, output.clone(), &["a"]);

    let batch = CommandBatch::new(["echo warning >&2"]);
    let aggregate = orchestrator.execute(&batch, "engine").await.unwrap();

    assert!(aggregate.succeeded());
    let line = &aggregate.outcome_for("a").unwrap().output[0];
    assert_eq!(line.stream, OutputStream::Stderr);
    assert_eq!(line.text, "warning");
    assert!(output.contains("[a | stderr]# warning"));
}

#[tokio::test]
async fn blank_lines_are_not_forwarded() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let orchestrator = orchestrator(transport, Arc::new(RecordingOutput::default()), &["a"]);

    let batch = CommandBatch::new(["printf 'x\\n\\n\\ny\\n'"]);
    let aggregate = orchestrator.execute(&batch, "engine").await.unwrap();

    let lines: Vec<_> = aggregate.outcome_for("a").unwrap().output.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(lines, vec!["x", "y"]);
}

#[tokio::test]
async fn empty_batch_succeeds_without_connecting() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let orchestrator = orchestrator(transport.clone(), Arc::new(RecordingOutput::default()), &["a", "b"]);

    let aggregate = orchestrator
        .execute(&CommandBatch::default(), "engine")
        .await
        .unwrap();

    assert!(aggregate.succeeded());
    assert_eq!(aggregate.outcomes.len(), 2);
    assert_eq!(transport.connects(), 0);
}

#[tokio::test]
async fn unreachable_target_is_a_connection_failure() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()).refuse("b"));
    let orchestrator = orchestrator(transport, Arc::new(RecordingOutput::default()), &["a", "b"]);

    let aggregate = orchestrator
        .execute(&CommandBatch::new(["echo hi"]), "engine")
        .await
        .unwrap();

    assert!(aggregate.outcome_for("a").unwrap().succeeded);
    assert!(matches!(
        aggregate.outcome_for("b").unwrap().error,
        Some(Error::Connection { .. })
    ));
}

#[tokio::test]
async fn lost_connection_mid_run_still_closes_the_session() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()).fail_run("b"));
    let orchestrator = orchestrator(transport.clone(), Arc::new(RecordingOutput::default()), &["a", "b", "c"]);

    let aggregate = orchestrator
        .execute(&CommandBatch::new(["echo hi"]), "engine")
        .await
        .unwrap();

    assert!(!aggregate.succeeded());
    assert!(matches!(
        aggregate.outcome_for("b").unwrap().error,
        Some(Error::Connection { ref host, .. }) if host == "b"
    ));
    assert!(aggregate.outcome_for("a").unwrap().succeeded);
    assert!(aggregate.outcome_for("c").unwrap().succeeded);

    let events = transport.events();
    for host in ["a", "b", "c"] {
        assert!(events.contains(&format!("close {}", host)), "no close for {}", host);
    }
}

#[tokio::test]
async fn undecodable_output_does_not_cut_the_stream_short() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let output = Arc::new(RecordingOutput::default());
    let orchestrator = orchestrator(transport, output.clone(), &["a"]);

    let batch = CommandBatch::new([
        "printf '\\377\\n'",
        "head -c 300000 /dev/zero | tr '\\0' x; echo",
        "echo tail-line",
    ]);
    let aggregate = orchestrator.execute(&batch, "engine").await.unwrap();

    assert!(aggregate.succeeded());
    let outcome = aggregate.outcome_for("a").unwrap();
    assert_eq!(outcome.output.last().map(|l| l.text.as_str()), Some("tail-line"));
    assert!(output.contains("[a | stdout]# tail-line"));
}

#[tokio::test]
async fn invalid_bytes_are_replaced_and_later_lines_kept() {
    let sandbox = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(sandbox.path()));
    let orchestrator = orchestrator(transport, Arc::new(RecordingOutput::default()), &["a"]);

    let batch = CommandBatch::new(["echo before", "printf 'caf\\351\\n'", "echo after"]);
    let aggregate = orchestrator.execute(&batch, "engine").await.unwrap();

    assert!(aggregate.succeeded());
    let lines: Vec<_> = aggregate.outcome_for("a").unwrap().output.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(lines, vec!["before", "caf\u{FFFD}", "after"]);
}

