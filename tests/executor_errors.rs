use std::time::Duration;

use runq::{Executor, ExecutorConfig, FailureKind};
use runq_test_utils::{Collector, init_tracing};

fn fast_config() -> ExecutorConfig {
    ExecutorConfig {
        poll_interval: Duration::from_millis(50),
        ..ExecutorConfig::default()
    }
}

#[tokio::test]
async fn missing_shell_reports_a_single_launch_failure() {
    init_tracing();

    let config = ExecutorConfig {
        shell: Some("/nonexistent/runq-shell".to_string()),
        ..fast_config()
    };
    let mut exec = Executor::new(config);
    exec.start();

    let collector = Collector::new();
    exec.submit("echo hi", collector.handler()).await;

    collector
        .wait_until(Duration::from_secs(3), |events| !events.is_empty())
        .await;

    let events = collector.events();
    assert_eq!(events.len(), 1, "exactly one delivery: {events:?}");
    let failures = collector.failures();
    assert_eq!(failures[0].0, FailureKind::Launch);
    assert!(!failures[0].1.is_empty(), "OS error description expected");

    let _ = exec.stop().await;
}

#[tokio::test]
async fn unknown_command_surfaces_the_shell_diagnostic() {
    init_tracing();

    let mut exec = Executor::new(fast_config());
    exec.start();

    // The shell itself spawns fine; its "not found" diagnostic arrives
    // on the merged stream like any other output.
    let collector = Collector::new();
    exec.submit("runq_no_such_command_xyz", collector.handler())
        .await;

    collector
        .wait_until(Duration::from_secs(3), |events| !events.is_empty())
        .await;

    assert!(
        collector.joined_chunks().contains("not found"),
        "shell diagnostic expected, got: {:?}",
        collector.events()
    );

    let _ = exec.stop().await;
}

#[tokio::test]
async fn dispatch_loop_survives_failed_commands() {
    init_tracing();

    let mut exec = Executor::new(fast_config());
    exec.start();

    let failed = Collector::new();
    exec.submit("runq_no_such_command_xyz", failed.handler()).await;
    let ok = Collector::new();
    exec.submit("echo alive", ok.handler()).await;

    ok.wait_for_output(Duration::from_secs(5), "alive\n").await;

    let _ = exec.stop().await;
}
