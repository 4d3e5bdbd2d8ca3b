//! Poll cycle and reconciliation behavior.

use std::time::{Duration, Instant};

use vpnwatch::fetcher::VPN_SUMMARY_COMMAND;
use vpnwatch::store::Status;

mod common;
use common::{build_stack, entry, fail, ok};

#[tokio::test]
async fn successful_fetch_overwrites_any_prior_status() {
    let stack = build_stack(3, Duration::from_millis(1)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack.store.mark_error("vpn1").await.unwrap();
    stack
        .transport
        .script("192.0.2.1", vec![ok(r#"{"n_clients": 5}"#)]);

    let report = stack.cycle.run().await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, "updated");
    assert_eq!(report.results[0].clients, Some(5));

    let target = stack.store.get("vpn1").await.unwrap().unwrap();
    assert_eq!(target.status, Status::Operational);
    assert_eq!(target.clients, 5);
    assert!(target.last_updated.is_some());
}

#[tokio::test]
async fn exhausted_retries_mark_error_and_keep_client_gauge() {
    let stack = build_stack(3, Duration::from_millis(1)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack.store.mark_operational("vpn1", 9).await.unwrap();
    stack
        .transport
        .script("192.0.2.1", vec![fail("connection refused")]);

    let report = stack.cycle.run().await.unwrap();

    assert_eq!(report.results[0].status, "error");
    let message = report.results[0].error.as_deref().unwrap();
    assert!(message.contains("after 3 attempts"), "got: {message}");
    // One attempt per retry, fresh session each time.
    assert_eq!(stack.transport.execs(), 3);

    let target = stack.store.get("vpn1").await.unwrap().unwrap();
    assert_eq!(target.status, Status::Error);
    assert_eq!(target.clients, 9, "stale gauge must be preserved");
}

#[tokio::test]
async fn one_failing_target_does_not_block_the_rest() {
    let stack = build_stack(1, Duration::from_millis(1)).await;
    for i in 1..=5 {
        let hostname = format!("vpn{i}");
        let ip = format!("192.0.2.{i}");
        stack.store.insert(&entry(&hostname, &ip)).await.unwrap();
        if i == 3 {
            stack.transport.script(&ip, vec![fail("kernel panic")]);
        } else {
            stack
                .transport
                .script(&ip, vec![ok(&format!(r#"{{"n_clients": {i}}}"#))]);
        }
    }

    let report = stack.cycle.run().await.unwrap();

    assert_eq!(report.results.len(), 5);
    assert_eq!(report.updated_count(), 4);
    assert_eq!(report.error_count(), 1);

    for i in [1, 2, 4, 5] {
        let target = stack.store.get(&format!("vpn{i}")).await.unwrap().unwrap();
        assert_eq!(target.status, Status::Operational);
        assert_eq!(target.clients, i as i64);
    }
    let bad = stack.store.get("vpn3").await.unwrap().unwrap();
    assert_eq!(bad.status, Status::Error);
}

#[tokio::test]
async fn two_failures_then_success_lands_operational_after_backoff() {
    let stack = build_stack(3, Duration::from_millis(100)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack.transport.script(
        "192.0.2.1",
        vec![
            fail("timeout"),
            fail("timeout"),
            ok(r#"{"n_clients": 7}"#),
        ],
    );

    let started = Instant::now();
    let report = stack.cycle.run().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.results[0].status, "updated");
    assert_eq!(report.results[0].clients, Some(7));
    // Linear backoff: 100ms after attempt 1, 200ms after attempt 2.
    assert!(elapsed >= Duration::from_millis(300), "elapsed: {elapsed:?}");

    let target = stack.store.get("vpn1").await.unwrap().unwrap();
    assert_eq!(target.status, Status::Operational);
    assert_eq!(target.clients, 7);
}

#[tokio::test]
async fn stderr_fails_the_attempt_even_with_parseable_stdout() {
    let stack = build_stack(1, Duration::from_millis(1)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack.transport.script(
        "192.0.2.1",
        vec![common::Attempt::Output {
            stdout: r#"{"n_clients": 99}"#.to_string(),
            stderr: "sacli: permission denied".to_string(),
        }],
    );

    let report = stack.cycle.run().await.unwrap();

    assert_eq!(report.results[0].status, "error");
    assert!(report.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("permission denied"));

    let target = stack.store.get("vpn1").await.unwrap().unwrap();
    assert_eq!(target.status, Status::Error);
    assert_eq!(target.clients, 0, "count from a failed attempt must not land");
}

#[tokio::test]
async fn summary_without_client_field_counts_as_zero() {
    let stack = build_stack(1, Duration::from_millis(1)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack
        .transport
        .script("192.0.2.1", vec![ok(r#"{"last_restarted": "Tue"}"#)]);

    let report = stack.cycle.run().await.unwrap();

    assert_eq!(report.results[0].status, "updated");
    assert_eq!(report.results[0].clients, Some(0));

    let target = stack.store.get("vpn1").await.unwrap().unwrap();
    assert_eq!(target.status, Status::Operational);
}

#[tokio::test]
async fn fetcher_runs_the_fixed_diagnostic_command() {
    let stack = build_stack(1, Duration::from_millis(1)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack
        .transport
        .script("192.0.2.1", vec![ok(r#"{"n_clients": 1}"#)]);

    stack.cycle.run().await.unwrap();

    let commands = stack.transport.commands.lock().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0], VPN_SUMMARY_COMMAND);
}

#[tokio::test]
async fn roster_changes_are_picked_up_between_cycles() {
    let stack = build_stack(1, Duration::from_millis(1)).await;
    stack.store.insert(&entry("vpn1", "192.0.2.1")).await.unwrap();
    stack
        .transport
        .script("192.0.2.1", vec![ok(r#"{"n_clients": 1}"#)]);
    stack
        .transport
        .script("192.0.2.2", vec![ok(r#"{"n_clients": 2}"#)]);

    let first = stack.cycle.run().await.unwrap();
    assert_eq!(first.results.len(), 1);

    stack.store.insert(&entry("vpn2", "192.0.2.2")).await.unwrap();
    let second = stack.cycle.run().await.unwrap();
    assert_eq!(second.results.len(), 2);
}
