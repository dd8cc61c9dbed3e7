//! `modgenie tool`: run the external module tool against a module directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::services::external_tool::{
    ExternalTool, GenerateRequest, PreviewOptions, ToolOutcome,
};
use crate::infra::command_runner::TokioCommandRunner;
use crate::output::progress;

/// Tool subcommands.
#[derive(Subcommand)]
pub enum ToolCommand {
    /// Validate a module directory
    Validate {
        /// Module directory, relative to the root
        dir: PathBuf,
        /// Check structure only, skip the Terraform validation
        #[arg(long)]
        check_only: bool,
    },
    /// Register a module preview with the control plane
    Preview(PreviewArgs),
    /// Scaffold a new module
    Generate(GenerateArgs),
}

/// Arguments for `tool preview`.
#[derive(Args)]
pub struct PreviewArgs {
    /// Module directory, relative to the root
    pub dir: PathBuf,
    /// Tool profile to use
    #[arg(short, long)]
    pub profile: Option<String>,
    /// Create the intent when it does not exist yet
    #[arg(short = 'a', long)]
    pub auto_create_intent: bool,
    /// Mark the module publishable
    #[arg(short = 'f', long)]
    pub publishable: bool,
    /// Repository URL; discovered from git when absent
    #[arg(short = 'g', long)]
    pub git_url: Option<String>,
    /// Repository ref; discovered from git when absent
    #[arg(short = 'r', long)]
    pub git_ref: Option<String>,
    /// Publish instead of registering a preview
    #[arg(long)]
    pub publish: bool,
}

/// Arguments for `tool generate`.
#[derive(Args)]
pub struct GenerateArgs {
    /// Directory to generate into, relative to the root
    pub dir: PathBuf,
    #[arg(short, long)]
    pub intent: String,
    #[arg(short, long)]
    pub flavor: String,
    #[arg(short, long)]
    pub cloud: String,
    #[arg(short, long)]
    pub title: String,
    #[arg(short, long)]
    pub description: String,
}

/// Run the tool command.
///
/// # Errors
///
/// Returns the `ToolError` of a failed, timed-out or unstartable run.
pub async fn run(app: &AppContext, cmd: ToolCommand) -> Result<ExitCode> {
    let tool = ExternalTool::new(TokioCommandRunner::new(), app.guard.clone(), &app.config.tool);
    let show = app.show_progress();
    let outcome = match cmd {
        ToolCommand::Validate { dir, check_only } => {
            progress::with_spinner(show, "Validating module...", tool.validate(&dir, check_only))
                .await?
        }
        ToolCommand::Preview(args) => {
            let options = PreviewOptions {
                profile: args.profile,
                auto_create_intent: args.auto_create_intent,
                publishable: args.publishable,
                git_url: args.git_url,
                git_ref: args.git_ref,
                publish: args.publish,
            };
            progress::with_spinner(show, "Registering preview...", tool.preview(&args.dir, &options))
                .await?
        }
        ToolCommand::Generate(args) => {
            let request = GenerateRequest {
                intent: args.intent,
                flavor: args.flavor,
                cloud: args.cloud,
                title: args.title,
                description: args.description,
                directory: args.dir,
            };
            progress::with_spinner(show, "Generating module...", tool.generate(&request)).await?
        }
    };
    render(app, &outcome)
}

fn render(app: &AppContext, outcome: &ToolOutcome) -> Result<ExitCode> {
    app.emit(outcome, |r| r.render_tool(outcome))?;
    Ok(ExitCode::SUCCESS)
}
