// tests/supervisor_process.rs

//! Supervision of real child processes via `sh`.

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use stagehand::errors::StagehandError;
use stagehand::exec::{Invocation, ProcessSupervisor, StreamSource};
use stagehand_test_utils::sink::BufferSink;

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> Invocation {
    Invocation::new("sh", vec!["-c".to_string(), script.to_string()])
}

#[tokio::test]
async fn captures_stdout_and_stderr_lines() -> TestResult {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());

    let outcome = supervisor
        .run(&sh("echo out1; echo err1 1>&2; echo out2"), sink.clone())
        .await?;

    assert_eq!(outcome.code, 0);
    assert!(outcome.success());
    assert!(outcome.stdout_drained && outcome.stderr_drained);

    // Ordering across the two streams is not deterministic; per-stream
    // ordering is.
    let stdout: Vec<String> = sink
        .lines()
        .into_iter()
        .filter(|(s, _)| *s == StreamSource::Stdout)
        .map(|(_, l)| l)
        .collect();
    let stderr: Vec<String> = sink
        .lines()
        .into_iter()
        .filter(|(s, _)| *s == StreamSource::Stderr)
        .map(|(_, l)| l)
        .collect();

    assert_eq!(stdout, vec!["out1", "out2"]);
    assert_eq!(stderr, vec!["err1"]);
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_an_outcome_not_an_error() -> TestResult {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());

    let outcome = supervisor.run(&sh("exit 3"), sink).await?;
    assert_eq!(outcome.code, 3);
    assert!(!outcome.success());
    Ok(())
}

/// Regression test for the "drain concurrently, don't wait-then-drain"
/// requirement: the child writes far more than an OS pipe buffer (64 KiB on
/// Linux) to *both* streams. A supervisor that waited for exit before
/// reading the pipes would deadlock here.
#[tokio::test]
async fn large_interleaved_output_does_not_deadlock() -> TestResult {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());

    let script = "i=0; while [ $i -lt 4000 ]; do \
                  echo stdout-line-$i; echo stderr-line-$i 1>&2; \
                  i=$((i+1)); done";

    let outcome = with_timeout(supervisor.run(&sh(script), sink.clone())).await?;

    assert_eq!(outcome.code, 0);
    let lines = sink.lines();
    let stdout_count = lines.iter().filter(|(s, _)| *s == StreamSource::Stdout).count();
    let stderr_count = lines.iter().filter(|(s, _)| *s == StreamSource::Stderr).count();
    assert_eq!(stdout_count, 4000);
    assert_eq!(stderr_count, 4000);
    Ok(())
}

#[tokio::test]
async fn missing_executable_is_a_launch_error_and_sink_stays_empty() {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());

    let invocation = Invocation::new(
        "/definitely/not/a/real/executable-xyz",
        vec!["--flag".to_string()],
    );
    let err = supervisor
        .run(&invocation, sink.clone())
        .await
        .expect_err("spawn must fail");

    match err {
        StagehandError::Launch { command, .. } => {
            assert!(command.contains("/definitely/not/a/real/executable-xyz"));
            assert!(command.contains("--flag"));
        }
        other => panic!("expected Launch error, got {other:?}"),
    }
    assert!(sink.is_empty(), "sink must never be called on launch failure");
}

#[tokio::test]
async fn invalid_utf8_is_replaced_not_fatal() -> TestResult {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());

    let outcome = supervisor
        .run(&sh(r"printf 'before \377\376 after\n'"), sink.clone())
        .await?;

    assert_eq!(outcome.code, 0);
    let texts = sink.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("before "));
    assert!(texts[0].ends_with(" after"));
    assert!(texts[0].contains('\u{FFFD}'));
    Ok(())
}

#[tokio::test]
async fn final_line_without_trailing_newline_is_captured() -> TestResult {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());

    supervisor.run(&sh("printf 'no newline here'"), sink.clone()).await?;
    assert_eq!(sink.texts(), vec!["no newline here"]);
    Ok(())
}

#[tokio::test]
async fn cancellation_kills_the_child_and_still_drains() {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());
    let (cancel_tx, cancel_rx) = oneshot::channel();

    let invocation = sh("echo started; sleep 30");
    let started = Instant::now();

    let (result, _) = tokio::join!(
        supervisor.run_with_cancel(&invocation, sink.clone(), cancel_rx),
        async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = cancel_tx.send(());
        }
    );

    match result {
        Err(StagehandError::Cancelled { command }) => assert!(command.starts_with("sh")),
        other => panic!("expected Cancelled, got {other:?}"),
    }

    // The 30s sleep must not have run to completion.
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(sink.texts(), vec!["started"]);
}

#[tokio::test]
async fn dropped_cancel_channel_behaves_like_no_cancellation() -> TestResult {
    init_tracing();
    let supervisor = ProcessSupervisor::new();
    let sink = Arc::new(BufferSink::new());
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    drop(cancel_tx);

    let outcome = supervisor
        .run_with_cancel(&sh("echo fine"), sink.clone(), cancel_rx)
        .await?;

    assert_eq!(outcome.code, 0);
    assert_eq!(sink.texts(), vec!["fine"]);
    Ok(())
}
