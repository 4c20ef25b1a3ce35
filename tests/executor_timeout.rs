use std::time::{Duration, Instant};

use runq::{Executor, ExecutorConfig, FailureKind, OutputEvent};
use runq_test_utils::{Collector, init_tracing};

fn short_timeout_config() -> ExecutorConfig {
    ExecutorConfig {
        timeout: Duration::from_secs(1),
        poll_interval: Duration::from_millis(50),
        ..ExecutorConfig::default()
    }
}

#[tokio::test]
async fn timeout_kills_process_and_reports_once() {
    init_tracing();

    let mut exec = Executor::new(short_timeout_config());
    exec.start();

    let collector = Collector::new();
    let started = Instant::now();
    exec.submit("sleep 20", collector.handler()).await;

    collector
        .wait_until(Duration::from_secs(5), |events| !events.is_empty())
        .await;
    let elapsed = started.elapsed();

    // The command is killed at the budget, not run to completion.
    assert!(elapsed >= Duration::from_secs(1), "killed too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "not killed at the budget: {elapsed:?}");

    let events = collector.events();
    assert_eq!(
        events,
        vec![OutputEvent::Failure {
            kind: FailureKind::Timeout,
            detail: "sleep 20 timed-out".to_string(),
        }],
        "a silent timed-out command yields exactly one event"
    );

    let _ = exec.stop().await;
}

#[tokio::test]
async fn output_before_the_timeout_is_still_delivered() {
    init_tracing();

    let mut exec = Executor::new(short_timeout_config());
    exec.start();

    let collector = Collector::new();
    exec.submit("echo tick; sleep 20", collector.handler()).await;

    collector
        .wait_until(Duration::from_secs(5), |events| {
            events
                .iter()
                .any(|e| matches!(e, OutputEvent::Failure { kind: FailureKind::Timeout, .. }))
        })
        .await;

    assert_eq!(collector.joined_chunks(), "tick\n");
    let failures = collector.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].1, "echo tick; sleep 20 timed-out");

    let _ = exec.stop().await;
}

#[tokio::test]
async fn background_child_holding_pipes_is_not_a_timeout() {
    init_tracing();

    let config = ExecutorConfig {
        timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(50),
        ..ExecutorConfig::default()
    };
    let mut exec = Executor::new(config);
    exec.start();

    // The shell exits immediately, but the backgrounded sleep inherits
    // its pipes and keeps them open well past the budget. That is a
    // normal termination, not a timeout.
    let collector = Collector::new();
    let started = Instant::now();
    exec.submit("sleep 10 & echo started", collector.handler()).await;

    // A follow-up command completing proves the runner returned.
    let after = Collector::new();
    exec.submit("echo next", after.handler()).await;
    after.wait_for_output(Duration::from_secs(5), "next\n").await;

    assert!(
        started.elapsed() < Duration::from_secs(2),
        "runner must return at shell exit, not at the budget"
    );
    assert_eq!(collector.joined_chunks(), "started\n");
    assert!(
        collector.failures().is_empty(),
        "no timeout for a normally terminated command: {:?}",
        collector.events()
    );

    let _ = exec.stop().await;
}

#[tokio::test]
async fn next_command_runs_after_a_timeout() {
    init_tracing();

    let mut exec = Executor::new(short_timeout_config());
    exec.start();

    let timed_out = Collector::new();
    exec.submit("sleep 20", timed_out.handler()).await;

    let after = Collector::new();
    exec.submit("echo alive", after.handler()).await;

    after.wait_for_output(Duration::from_secs(5), "alive\n").await;
    assert_eq!(
        timed_out.failures(),
        vec![(FailureKind::Timeout, "sleep 20 timed-out".to_string())]
    );

    let _ = exec.stop().await;
}
