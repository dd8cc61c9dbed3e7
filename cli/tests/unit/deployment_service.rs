//! Test deployment orchestration against a fake control plane and clock.

use std::time::Duration;

use modgenie_cli::application::SilentReporter;
use modgenie_cli::application::services::deployment::{DeploymentOrchestrator, PollOptions};
use modgenie_cli::domain::deployment::{DeploymentRef, DeploymentRequest, DeploymentStatus};
use modgenie_cli::domain::descriptor::ModuleRef;
use modgenie_cli::domain::error::DeployError;

use crate::helpers::{FakeClock, FakeControlPlane, StatusReply, cluster, log_lines, resource};

fn request(project: &str) -> DeploymentRequest {
    DeploymentRequest {
        project: project.into(),
        module: ModuleRef {
            intent: "postgres".into(),
            flavor: "rds".into(),
            version: "1.0".into(),
        },
        artifact: None,
    }
}

fn handle() -> DeploymentRef {
    DeploymentRef {
        cluster_id: "c1".into(),
        deployment_id: "d1".into(),
    }
}

fn waiting(timeout_secs: u64, interval_secs: u64) -> PollOptions {
    PollOptions {
        wait: true,
        timeout: Duration::from_secs(timeout_secs),
        interval: Duration::from_secs(interval_secs),
    }
}

// ── submit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_targets_matching_resources_in_running_environment() {
    let cp = FakeControlPlane::healthy();
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch.submit(&request("qa")).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Running);
    assert_eq!(record.id, "d1");
    assert_eq!(record.cluster_id.as_deref(), Some("c1"));
    assert_eq!(record.resources, vec!["db".to_string()]);
    assert_eq!(record.remote_status.as_deref(), Some("QUEUED"));
    let hotfixes = cp.hotfixes.lock().unwrap();
    assert_eq!(hotfixes[0].0, "c1");
    assert_eq!(hotfixes[0].1.resource_list[0].resource_name, "db");
    assert!(orch.record(&handle()).is_some());
}

#[tokio::test]
async fn test_artifact_reference_is_kept_on_the_record() {
    let cp = FakeControlPlane::healthy();
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);
    let mut req = request("qa");
    req.artifact = Some("postgres-rds-1.0-preview-42".into());

    let record = orch.submit(&req).await.unwrap();

    assert_eq!(record.artifact.as_deref(), Some("postgres-rds-1.0-preview-42"));
    assert_eq!(
        orch.record(&handle()).unwrap().artifact.as_deref(),
        Some("postgres-rds-1.0-preview-42")
    );
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["artifact"], "postgres-rds-1.0-preview-42");
}

#[tokio::test]
async fn test_unknown_project_fails_the_record() {
    let cp = FakeControlPlane::healthy();
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch.submit(&request("staging")).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("not found"));
    assert!(record.completed_at.is_some());
    assert_eq!(cp.hotfix_count(), 0);
}

#[tokio::test]
async fn test_project_without_preview_modules_fails_the_record() {
    let cp = FakeControlPlane::healthy();
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch.submit(&request("prod")).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("preview modules"));
}

#[tokio::test]
async fn test_two_running_environments_fail_the_record() {
    let mut cp = FakeControlPlane::healthy();
    cp.clusters.push(cluster("c2", "qa-env-2", "RUNNING"));
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch.submit(&request("qa")).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("exactly one running"), "{:?}", record.error);
    assert_eq!(cp.hotfix_count(), 0);
}

#[tokio::test]
async fn test_stopped_environment_does_not_count() {
    let mut cp = FakeControlPlane::healthy();
    cp.clusters = vec![cluster("c1", "qa-env", "STOPPED")];
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch.submit(&request("qa")).await.unwrap();
    assert_eq!(record.status, DeploymentStatus::Failed);
}

#[tokio::test]
async fn test_no_matching_resource_fails_the_record() {
    let mut cp = FakeControlPlane::healthy();
    cp.resources = vec![resource("db", "postgres", "rds", "0.9")];
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch.submit(&request("qa")).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("postgres/rds/1.0"), "{:?}", record.error);
}

#[tokio::test]
async fn test_list_test_projects_filters_on_preview_flag() {
    let cp = FakeControlPlane::healthy();
    let clock = FakeClock::new();
    let orch = DeploymentOrchestrator::new(&cp, &clock);

    let projects = orch.list_test_projects().await.unwrap();

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "qa");
}

// ── poll_status ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wait_gives_up_at_timeout_without_real_sleeping() {
    let cp = FakeControlPlane::healthy().replying([StatusReply::Status("IN_PROGRESS")]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let started = std::time::Instant::now();
    let record = orch
        .poll_status(&handle(), waiting(5, 1), &SilentReporter)
        .await
        .unwrap();

    assert_eq!(record.status, DeploymentStatus::TimedOut);
    assert!(clock.elapsed() >= Duration::from_secs(5));
    assert!(clock.elapsed() < Duration::from_secs(6));
    assert_eq!(cp.status_calls(), 6);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_last_sleep_is_clamped_to_the_remaining_budget() {
    let cp = FakeControlPlane::healthy().replying([StatusReply::Status("STARTED")]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    orch.poll_status(&handle(), waiting(7, 3), &SilentReporter)
        .await
        .unwrap();

    let sleeps = clock.sleeps.lock().unwrap().clone();
    assert_eq!(
        sleeps,
        vec![Duration::from_secs(3), Duration::from_secs(3), Duration::from_secs(1)]
    );
}

#[tokio::test]
async fn test_wait_stops_as_soon_as_the_deployment_finishes() {
    let cp = FakeControlPlane::healthy().replying([
        StatusReply::Status("QUEUED"),
        StatusReply::Status("IN_PROGRESS"),
        StatusReply::Status("SUCCEEDED"),
    ]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch
        .poll_status(&handle(), waiting(300, 5), &SilentReporter)
        .await
        .unwrap();

    assert_eq!(record.status, DeploymentStatus::Succeeded);
    assert_eq!(record.remote_status.as_deref(), Some("SUCCEEDED"));
    assert!(record.completed_at.is_some());
    assert_eq!(clock.elapsed(), Duration::from_secs(10));
}

#[tokio::test]
async fn test_unknown_remote_status_is_failed() {
    let cp = FakeControlPlane::healthy().replying([StatusReply::Status("FAULT")]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let record = orch
        .poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap();

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert_eq!(record.remote_status.as_deref(), Some("FAULT"));
}

#[tokio::test]
async fn test_terminal_status_never_changes_and_skips_the_remote() {
    let cp = FakeControlPlane::healthy().replying([
        StatusReply::Status("SUCCEEDED"),
        StatusReply::Status("FAILED"),
    ]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let first = orch
        .poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap();
    let second = orch
        .poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap();

    assert_eq!(first.status, DeploymentStatus::Succeeded);
    assert_eq!(second.status, DeploymentStatus::Succeeded);
    assert_eq!(second.completed_at, first.completed_at);
    assert_eq!(cp.status_calls(), 1);
}

#[tokio::test]
async fn test_timed_out_record_can_finish_on_a_later_poll() {
    let cp = FakeControlPlane::healthy().replying([
        StatusReply::Status("IN_PROGRESS"),
        StatusReply::Status("IN_PROGRESS"),
        StatusReply::Status("SUCCEEDED"),
    ]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let timed_out = orch
        .poll_status(&handle(), waiting(1, 1), &SilentReporter)
        .await
        .unwrap();
    assert_eq!(timed_out.status, DeploymentStatus::TimedOut);

    let done = orch
        .poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap();
    assert_eq!(done.status, DeploymentStatus::Succeeded);
}

#[tokio::test]
async fn test_unreachable_control_plane_keeps_last_known_status() {
    let cp = FakeControlPlane::healthy().replying([
        StatusReply::Status("IN_PROGRESS"),
        StatusReply::Unreachable,
    ]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    orch.poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap();
    let err = orch
        .poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Poll { .. }), "{err:?}");
    assert_eq!(err.code(), "poll_error");
    assert_eq!(orch.record(&handle()).unwrap().status, DeploymentStatus::Running);
}

#[tokio::test]
async fn test_deployment_unknown_to_the_remote_is_a_poll_error() {
    let cp = FakeControlPlane::healthy().replying([StatusReply::Missing]);
    let clock = FakeClock::new();
    let mut orch = DeploymentOrchestrator::new(&cp, &clock);

    let err = orch
        .poll_status(&handle(), PollOptions::once(), &SilentReporter)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("not found"), "{err}");
}

// ── fetch_logs ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_logs_are_returned_in_order() {
    let mut cp = FakeControlPlane::healthy();
    cp.logs = Some(log_lines(&["terraform init", "terraform apply"]));
    let clock = FakeClock::new();
    let orch = DeploymentOrchestrator::new(&cp, &clock);

    let lines = orch.fetch_logs(&handle()).await.unwrap();

    assert_eq!(lines, vec!["terraform init".to_string(), "terraform apply".to_string()]);
}

#[tokio::test]
async fn test_missing_logs_are_empty() {
    let cp = FakeControlPlane::healthy();
    let clock = FakeClock::new();
    let orch = DeploymentOrchestrator::new(&cp, &clock);

    assert!(orch.fetch_logs(&handle()).await.unwrap().is_empty());
}
