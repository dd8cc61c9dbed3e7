//! Deployment lifecycle types and the status state machine.
//!
//! Pure data only. The orchestrator in `application::services::deployment`
//! is the only code that mutates a [`DeploymentRecord`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::descriptor::ModuleRef;
use crate::domain::error::TransitionError;

/// Remote status strings that mean the deployment is still executing.
pub const REMOTE_RUNNING: &[&str] = &["IN_PROGRESS", "STARTED", "QUEUED"];
/// Remote status string for a successful deployment.
pub const REMOTE_SUCCEEDED: &str = "SUCCEEDED";

/// Status of a test deployment as tracked by this process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Created,
    Submitting,
    Running,
    Succeeded,
    Failed,
    /// The local wait budget ran out. The remote job keeps running.
    TimedOut,
}

impl DeploymentStatus {
    /// `SUCCEEDED` and `FAILED` never change once observed.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether a record in `self` may move to `next`.
    ///
    /// `TIMED_OUT` is only final for the wait that produced it, so a later
    /// poll may move it on.
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        use DeploymentStatus::{Created, Failed, Running, Submitting, Succeeded, TimedOut};
        match (self, next) {
            (Created, Submitting)
            | (Submitting, Running | Failed)
            | (Running | TimedOut, Running | Succeeded | Failed | TimedOut) => true,
            (a, b) => a == b && a.is_terminal(),
        }
    }

    /// Map a control-plane status string onto the local state machine.
    #[must_use]
    pub fn from_remote(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        if REMOTE_RUNNING.contains(&upper.as_str()) {
            Self::Running
        } else if upper == REMOTE_SUCCEEDED {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Submitting => "SUBMITTING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// What to deploy and where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// Test project (stack) name.
    pub project: String,
    pub module: ModuleRef,
    /// Reference to the previewed artifact, when the caller has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

/// Address of a remote deployment. Also the handle used for log retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DeploymentRef {
    pub cluster_id: String,
    pub deployment_id: String,
}

impl fmt::Display for DeploymentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster_id, self.deployment_id)
    }
}

/// In-memory view of one deployment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeploymentRecord {
    /// Remote deployment id. Empty until the submit call returns one.
    pub id: String,
    pub cluster_id: Option<String>,
    pub project: Option<String>,
    pub module: Option<ModuleRef>,
    /// Previewed artifact the deployment was requested for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub status: DeploymentStatus,
    /// Raw status string last reported by the control plane.
    pub remote_status: Option<String>,
    /// Resources included in the hotfix request.
    pub resources: Vec<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    /// Fresh record for a request about to be submitted.
    #[must_use]
    pub fn new(request: &DeploymentRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            cluster_id: None,
            project: Some(request.project.clone()),
            module: Some(request.module.clone()),
            artifact: request.artifact.clone(),
            status: DeploymentStatus::Created,
            remote_status: None,
            resources: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Record for a deployment this process did not submit, first seen running.
    #[must_use]
    pub fn observed(reference: &DeploymentRef, now: DateTime<Utc>) -> Self {
        Self {
            id: reference.deployment_id.clone(),
            cluster_id: Some(reference.cluster_id.clone()),
            project: None,
            module: None,
            artifact: None,
            status: DeploymentStatus::Running,
            remote_status: None,
            resources: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Move to `next`, stamping timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the state machine forbids the move.
    pub fn transition(
        &mut self,
        next: DeploymentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        if next.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// Fail the record with a reason. Used for submit-time failures.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the record cannot fail from its
    /// current state.
    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(DeploymentStatus::Failed, now)?;
        self.error = Some(reason.into());
        Ok(())
    }

    /// Log/status handle, once the remote side has assigned one.
    #[must_use]
    pub fn handle(&self) -> Option<DeploymentRef> {
        match &self.cluster_id {
            Some(cluster_id) if !self.id.is_empty() => Some(DeploymentRef {
                cluster_id: cluster_id.clone(),
                deployment_id: self.id.clone(),
            }),
            _ => None,
        }
    }
}
