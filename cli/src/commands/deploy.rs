//! `modgenie deploy`: test deployments of previewed modules.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::services::deployment::{DeploymentOrchestrator, PollOptions};
use crate::domain::config::DeployConfig;
use crate::domain::deployment::{DeploymentRecord, DeploymentRef, DeploymentRequest, DeploymentStatus};
use crate::domain::descriptor::ModuleRef;
use crate::infra::clock::TokioClock;
use crate::infra::control_plane::HttpControlPlane;
use crate::output::{TerminalReporter, progress};

/// Deploy subcommands.
#[derive(Subcommand)]
pub enum DeployCommand {
    /// List projects that accept preview modules
    Projects,
    /// Start a test deployment of a previewed module
    Test(TestArgs),
    /// Show a deployment's status
    Status {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Print a deployment's logs
    Logs {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Arguments for `deploy test`.
#[derive(Args)]
pub struct TestArgs {
    /// Test project name
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub intent: String,
    #[arg(long)]
    pub flavor: String,
    #[arg(long)]
    pub version: String,
    /// Artifact reference produced by `tool preview`
    #[arg(long)]
    pub artifact: Option<String>,
    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Deployment address.
#[derive(Args)]
pub struct TargetArgs {
    /// Environment (cluster) id
    #[arg(long)]
    pub cluster: String,
    /// Deployment id
    #[arg(long)]
    pub deployment: String,
}

/// Polling flags.
#[derive(Args)]
pub struct WaitArgs {
    /// Keep polling until the deployment finishes
    #[arg(long)]
    pub wait: bool,
    /// Seconds to wait before giving up (default: deploy.timeout_secs)
    #[arg(long, value_name = "SECS", requires = "wait")]
    pub timeout: Option<u64>,
    /// Seconds between polls (default: deploy.poll_interval_secs)
    #[arg(long, value_name = "SECS", requires = "wait")]
    pub interval: Option<u64>,
}

impl WaitArgs {
    fn options(&self, defaults: &DeployConfig) -> PollOptions {
        if !self.wait {
            return PollOptions::once();
        }
        PollOptions {
            wait: true,
            timeout: Duration::from_secs(self.timeout.unwrap_or(defaults.timeout_secs)),
            interval: Duration::from_secs(self.interval.unwrap_or(defaults.poll_interval_secs)),
        }
    }
}

impl TargetArgs {
    fn reference(&self) -> DeploymentRef {
        DeploymentRef {
            cluster_id: self.cluster.clone(),
            deployment_id: self.deployment.clone(),
        }
    }
}

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error if the control plane settings are missing or a status
/// or log request fails.
pub async fn run(app: &AppContext, cmd: DeployCommand) -> Result<ExitCode> {
    let mut orchestrator = DeploymentOrchestrator::new(HttpControlPlane::from_env()?, TokioClock);
    let reporter = TerminalReporter::new(&app.output);
    let show = app.show_progress();

    match cmd {
        DeployCommand::Projects => {
            let projects =
                progress::with_spinner(show, "Fetching projects...", orchestrator.list_test_projects())
                    .await?;
            app.emit(&projects, |r| r.render_projects(&projects))?;
            Ok(ExitCode::SUCCESS)
        }
        DeployCommand::Test(args) => {
            let request = DeploymentRequest {
                project: args.project,
                module: ModuleRef {
                    intent: args.intent,
                    flavor: args.flavor,
                    version: args.version,
                },
                artifact: args.artifact,
            };
            let mut record =
                progress::with_spinner(show, "Starting test deployment...", orchestrator.submit(&request))
                    .await?;
            if args.wait.wait
                && let Some(handle) = record.handle()
            {
                let options = args.wait.options(&app.config.deploy);
                record = orchestrator.poll_status(&handle, options, &reporter).await?;
            }
            finish(app, &record)
        }
        DeployCommand::Status { target, wait } => {
            let options = wait.options(&app.config.deploy);
            let record = orchestrator
                .poll_status(&target.reference(), options, &reporter)
                .await?;
            finish(app, &record)
        }
        DeployCommand::Logs { target } => {
            let lines = orchestrator.fetch_logs(&target.reference()).await?;
            app.emit(&lines, |r| r.render_logs(&lines))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Render the record; a failed deployment exits non-zero.
fn finish(app: &AppContext, record: &DeploymentRecord) -> Result<ExitCode> {
    app.emit(record, |r| r.render_deployment(record))?;
    if record.status == DeploymentStatus::Failed {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
