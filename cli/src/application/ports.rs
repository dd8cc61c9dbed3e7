//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared wire types,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};

use anyhow::Result;
use modgenie_common::{
    ClusterOverview, DeploymentDto, DeploymentLogs, HotfixRecipe, OutputType, ResourceInfo, Stack,
};

use crate::domain::ModgenieConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `program` in `cwd` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_in(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Control Plane Port ────────────────────────────────────────────────────────

/// The remote deployment control plane.
///
/// Lookups return `Ok(None)` for a 404 so callers can tell "missing" from
/// "unreachable".
#[allow(async_fn_in_trait)]
pub trait ControlPlane {
    /// All projects visible to the configured user.
    async fn list_stacks(&self) -> Result<Vec<Stack>>;
    /// A single project by name.
    async fn get_stack(&self, name: &str) -> Result<Option<Stack>>;
    /// Environments of a project with their state.
    async fn clusters_overview(&self, stack: &str) -> Result<Vec<ClusterOverview>>;
    /// Resources declared in an environment.
    async fn cluster_resources(&self, cluster_id: &str) -> Result<Vec<ResourceInfo>>;
    /// Start a targeted (hotfix) deployment of the given resources.
    async fn trigger_hotfix(&self, cluster_id: &str, recipe: &HotfixRecipe)
    -> Result<DeploymentDto>;
    /// Current state of one deployment.
    async fn get_deployment(
        &self,
        cluster_id: &str,
        deployment_id: &str,
    ) -> Result<Option<DeploymentDto>>;
    /// Logs produced so far by one deployment.
    async fn deployment_logs(
        &self,
        cluster_id: &str,
        deployment_id: &str,
    ) -> Result<Option<DeploymentLogs>>;
    /// Every registered output type.
    async fn list_output_types(&self) -> Result<Vec<OutputType>>;
    /// One output type by namespace (`@outputs`) and name.
    async fn get_output_type(&self, namespace: &str, name: &str) -> Result<Option<OutputType>>;
}

// ── Clock Port ────────────────────────────────────────────────────────────────

/// Time source for bounded polling. Tests substitute a virtual clock.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

// ── Config Store Port ─────────────────────────────────────────────────────────

/// Persistence for [`ModgenieConfig`].
pub trait ConfigStore {
    /// Load the config, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<ModgenieConfig>;
    /// Persist the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &ModgenieConfig) -> Result<()>;
    /// Location of the backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Reporter that discards everything.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}
