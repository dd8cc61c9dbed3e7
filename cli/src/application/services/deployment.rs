//! Application service: test deployments against the control plane.
//!
//! [`DeploymentOrchestrator`] owns every [`DeploymentRecord`] in the process
//! and is the only code that changes their status. Waiting is an explicit
//! loop over the injected [`Clock`], so tests drive time without sleeping.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use modgenie_common::{FacetsResource, HotfixRecipe, Stack};

use crate::application::ports::{Clock, ControlPlane, ProgressReporter};
use crate::domain::deployment::{DeploymentRecord, DeploymentRef, DeploymentRequest, DeploymentStatus};
use crate::domain::error::{DeployError, TransitionError};

/// How `poll_status` should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Keep polling until terminal or `timeout`.
    pub wait: bool,
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollOptions {
    /// A single status check.
    #[must_use]
    pub fn once() -> Self {
        Self {
            wait: false,
            timeout: Duration::ZERO,
            interval: Duration::ZERO,
        }
    }
}

/// A resolved hotfix submission.
struct Submission {
    cluster_id: String,
    deployment_id: String,
    remote_status: String,
    resources: Vec<String>,
}

/// Drives submit → poll → logs for test deployments.
pub struct DeploymentOrchestrator<C: ControlPlane, K: Clock> {
    control_plane: C,
    clock: K,
    records: HashMap<DeploymentRef, DeploymentRecord>,
}

impl<C: ControlPlane, K: Clock> DeploymentOrchestrator<C, K> {
    pub fn new(control_plane: C, clock: K) -> Self {
        Self {
            control_plane,
            clock,
            records: HashMap::new(),
        }
    }

    /// Record for `reference`, if this process has seen it.
    #[must_use]
    pub fn record(&self, reference: &DeploymentRef) -> Option<&DeploymentRecord> {
        self.records.get(reference)
    }

    /// Projects that accept previewed modules.
    ///
    /// # Errors
    ///
    /// `ControlPlane` when the project list cannot be fetched.
    pub async fn list_test_projects(&self) -> Result<Vec<Stack>, DeployError> {
        let stacks = self
            .control_plane
            .list_stacks()
            .await
            .map_err(|e| DeployError::ControlPlane(format!("{e:#}")))?;
        Ok(stacks.into_iter().filter(|s| s.preview_modules_allowed).collect())
    }

    /// Start a test deployment.
    ///
    /// Resolution or submission problems do not error: they come back as a
    /// `FAILED` record with the reason in `error`. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Only on an internal state machine violation.
    pub async fn submit(&mut self, request: &DeploymentRequest) -> Result<DeploymentRecord, TransitionError> {
        let mut record = DeploymentRecord::new(request, Utc::now());
        record.transition(DeploymentStatus::Submitting, Utc::now())?;
        tracing::info!(
            project = %request.project,
            module = %request.module,
            artifact = request.artifact.as_deref().unwrap_or("-"),
            "submitting test deployment"
        );

        match self.resolve_and_trigger(request).await {
            Ok(sub) => {
                record.id = sub.deployment_id;
                record.cluster_id = Some(sub.cluster_id);
                record.resources = sub.resources;
                record.remote_status = Some(sub.remote_status);
                record.transition(DeploymentStatus::Running, Utc::now())?;
                if let Some(handle) = record.handle() {
                    tracing::info!(deployment = %handle, "test deployment started");
                    self.records.insert(handle, record.clone());
                }
            }
            Err(reason) => {
                tracing::warn!(project = %request.project, %reason, "test deployment not started");
                record.fail(reason, Utc::now())?;
            }
        }
        Ok(record)
    }

    /// Check a deployment's status, optionally waiting for it to finish.
    ///
    /// A record already `SUCCEEDED` or `FAILED` is returned without a remote
    /// call. When the wait budget runs out the record is `TIMED_OUT`; the
    /// remote deployment is left running.
    ///
    /// # Errors
    ///
    /// `Poll` when the control plane cannot be reached or does not know the
    /// deployment. The record keeps its last known status.
    pub async fn poll_status(
        &mut self,
        reference: &DeploymentRef,
        options: PollOptions,
        reporter: &impl ProgressReporter,
    ) -> Result<DeploymentRecord, DeployError> {
        let current = self
            .records
            .entry(reference.clone())
            .or_insert_with(|| DeploymentRecord::observed(reference, Utc::now()))
            .status;
        if current.is_terminal() {
            return Ok(self.snapshot(reference));
        }

        if !options.wait {
            self.check_once(reference).await?;
            return Ok(self.snapshot(reference));
        }

        let started = self.clock.now();
        loop {
            let status = self.check_once(reference).await?;
            if status.is_terminal() {
                return Ok(self.snapshot(reference));
            }
            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= options.timeout {
                tracing::info!(deployment = %reference, waited = ?elapsed, "stopped waiting for deployment");
                self.set_status(reference, DeploymentStatus::TimedOut)?;
                return Ok(self.snapshot(reference));
            }
            reporter.step(&format!(
                "deployment {} is {status} ({}s elapsed)",
                reference.deployment_id,
                elapsed.as_secs()
            ));
            let remaining = options.timeout.saturating_sub(elapsed);
            self.clock.sleep(options.interval.min(remaining)).await;
        }
    }

    /// Log lines produced so far. Read-only; valid in any state.
    ///
    /// # Errors
    ///
    /// `Logs` when the control plane cannot be reached.
    pub async fn fetch_logs(&self, reference: &DeploymentRef) -> Result<Vec<String>, DeployError> {
        let logs = self
            .control_plane
            .deployment_logs(&reference.cluster_id, &reference.deployment_id)
            .await
            .map_err(|e| DeployError::Logs {
                deployment: reference.to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(logs.map(|l| l.lines()).unwrap_or_default())
    }

    // ── internals ────────────────────────────────────────────────────────────

    async fn check_once(&mut self, reference: &DeploymentRef) -> Result<DeploymentStatus, DeployError> {
        let poll_error = |reason: String| DeployError::Poll {
            deployment: reference.to_string(),
            reason,
        };
        let dto = self
            .control_plane
            .get_deployment(&reference.cluster_id, &reference.deployment_id)
            .await
            .map_err(|e| poll_error(format!("{e:#}")))?
            .ok_or_else(|| poll_error("deployment not found".to_string()))?;

        let next = DeploymentStatus::from_remote(&dto.status);
        tracing::debug!(deployment = %reference, remote = %dto.status, status = %next, "polled deployment");

        let record = self
            .records
            .entry(reference.clone())
            .or_insert_with(|| DeploymentRecord::observed(reference, Utc::now()));
        record.remote_status = Some(dto.status);
        record
            .transition(next, Utc::now())
            .map_err(|e| poll_error(e.to_string()))?;
        if next.is_terminal()
            && let Some(done) = dto.completed_at
        {
            record.completed_at = Some(done);
        }
        Ok(next)
    }

    fn set_status(&mut self, reference: &DeploymentRef, status: DeploymentStatus) -> Result<(), DeployError> {
        if let Some(record) = self.records.get_mut(reference) {
            record.transition(status, Utc::now()).map_err(|e| DeployError::Poll {
                deployment: reference.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn snapshot(&self, reference: &DeploymentRef) -> DeploymentRecord {
        self.records
            .get(reference)
            .cloned()
            .unwrap_or_else(|| DeploymentRecord::observed(reference, Utc::now()))
    }

    /// Find the single running environment and the resources using the
    /// module, then trigger a hotfix deployment of exactly those resources.
    async fn resolve_and_trigger(&self, request: &DeploymentRequest) -> Result<Submission, String> {
        let cp_error = |e: anyhow::Error| format!("control plane request failed: {e:#}");
        let project = &request.project;
        let module = &request.module;

        let stack = self
            .control_plane
            .get_stack(project)
            .await
            .map_err(cp_error)?
            .ok_or_else(|| format!("project '{project}' not found"))?;
        if !stack.preview_modules_allowed {
            return Err(format!("project '{project}' does not allow preview modules"));
        }

        let running: Vec<_> = self
            .control_plane
            .clusters_overview(project)
            .await
            .map_err(cp_error)?
            .into_iter()
            .filter(modgenie_common::ClusterOverview::is_running)
            .collect();
        let [environment] = running.as_slice() else {
            return Err(format!(
                "project '{project}' must have exactly one running environment, found {}",
                running.len()
            ));
        };
        let cluster_id = environment.cluster.id.clone();

        let resources: Vec<FacetsResource> = self
            .control_plane
            .cluster_resources(&cluster_id)
            .await
            .map_err(cp_error)?
            .into_iter()
            .filter(|r| r.matches_module(&module.intent, &module.flavor, &module.version))
            .map(|r| FacetsResource {
                resource_name: r.resource_name,
                resource_type: r.resource_type,
            })
            .collect();
        if resources.is_empty() {
            return Err(format!(
                "no enabled resource in environment '{}' uses module {module}",
                environment.cluster.name
            ));
        }

        let names = resources.iter().map(|r| r.resource_name.clone()).collect();
        let recipe = HotfixRecipe {
            resource_list: resources,
        };
        let dto = self
            .control_plane
            .trigger_hotfix(&cluster_id, &recipe)
            .await
            .map_err(cp_error)?;

        Ok(Submission {
            cluster_id,
            deployment_id: dto.id,
            remote_status: dto.status,
            resources: names,
        })
    }
}
