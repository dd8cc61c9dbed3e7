//! `modgenie write`: previewed, guarded writes into module directories.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::{Map, Value};

use crate::app::AppContext;
use crate::application::services::config_writer::{ConfigWriter, DryRunResult, WriteOutcome};
use crate::application::services::output_types::OutputTypeCatalog;
use crate::infra::control_plane::HttpControlPlane;
use crate::output::progress;

/// Write subcommands.
#[derive(Subcommand)]
pub enum WriteCommand {
    /// Show the diff and validation result without writing
    Preview(ContentArgs),
    /// Write a previewed file
    Commit {
        #[command(flatten)]
        content: ContentArgs,
        /// Token printed by `write preview`
        #[arg(long)]
        token: Option<String>,
    },
    /// Replace an exact block of text in an existing file
    Edit(EditArgs),
    /// Render and replace a module's output interface file
    Outputs(OutputsArgs),
}

/// Target file plus its proposed content.
#[derive(Args)]
pub struct ContentArgs {
    /// File path, relative to the root
    pub file: PathBuf,
    /// Read the proposed content from this file (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    pub content_file: PathBuf,
    /// Reject descriptors referencing output types the control plane does not know
    #[arg(long)]
    pub check_types: bool,
}

/// Arguments for `write edit`.
#[derive(Args)]
pub struct EditArgs {
    /// File path, relative to the root
    pub file: PathBuf,
    /// Exact text to replace
    #[arg(long)]
    pub old: String,
    /// Replacement text
    #[arg(long)]
    pub new: String,
    /// Number of occurrences that must match
    #[arg(long, default_value_t = 1)]
    pub expected: usize,
    /// Write the result instead of previewing it
    #[arg(long)]
    pub commit: bool,
    /// Token printed by the preview run
    #[arg(long, requires = "commit")]
    pub token: Option<String>,
}

/// Arguments for `write outputs`.
#[derive(Args)]
pub struct OutputsArgs {
    /// Module directory, relative to the root
    pub dir: PathBuf,
    /// JSON object of output attributes
    #[arg(long, default_value = "{}")]
    pub attributes: String,
    /// JSON object of output interfaces
    #[arg(long, default_value = "{}")]
    pub interfaces: String,
    /// Show the rendered diff without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the write command.
///
/// # Errors
///
/// Returns an error if the target escapes the root, the content is invalid,
/// or a strict-mode commit lacks a current preview token.
pub async fn run(app: &AppContext, cmd: WriteCommand) -> Result<ExitCode> {
    let writer = ConfigWriter::new(app.guard.clone(), app.config.writer.strict_preview);
    match cmd {
        WriteCommand::Preview(args) => {
            let content = read_content(&args.content_file)?;
            let writer = with_type_check(app, writer, args.check_types).await?;
            let dry = writer.preview(&args.file, &content)?;
            show_dry_run(app, &writer, &dry)
        }
        WriteCommand::Commit { content, token } => {
            let text = read_content(&content.content_file)?;
            let writer = with_type_check(app, writer, content.check_types).await?;
            let outcome = writer.commit(&content.file, &text, token.as_deref())?;
            show_outcome(app, &outcome)
        }
        WriteCommand::Edit(args) => edit(app, &writer, &args),
        WriteCommand::Outputs(args) => outputs(app, &writer, &args),
    }
}

async fn with_type_check(app: &AppContext, writer: ConfigWriter, enabled: bool) -> Result<ConfigWriter> {
    if !enabled {
        return Ok(writer);
    }
    let catalog = OutputTypeCatalog::new(HttpControlPlane::from_env()?);
    let registered =
        progress::with_spinner(app.show_progress(), "Fetching output types...", catalog.registered_names())
            .await?;
    Ok(writer.with_registered_types(registered))
}

fn edit(app: &AppContext, writer: &ConfigWriter, args: &EditArgs) -> Result<ExitCode> {
    if args.commit {
        let outcome = writer.commit_edit(
            &args.file,
            &args.old,
            &args.new,
            args.expected,
            args.token.as_deref(),
        )?;
        return show_outcome(app, &outcome);
    }
    let dry = writer.edit(&args.file, &args.old, &args.new, args.expected)?;
    show_dry_run(app, writer, &dry)
}

fn outputs(app: &AppContext, writer: &ConfigWriter, args: &OutputsArgs) -> Result<ExitCode> {
    let attributes = parse_object("--attributes", &args.attributes)?;
    let interfaces = parse_object("--interfaces", &args.interfaces)?;
    if args.dry_run {
        let dry = writer.preview_output_interface(&args.dir, &attributes, &interfaces)?;
        return show_dry_run(app, writer, &dry);
    }
    let outcome = writer.write_output_interface(&args.dir, &attributes, &interfaces)?;
    show_outcome(app, &outcome)
}

fn show_dry_run(app: &AppContext, writer: &ConfigWriter, dry: &DryRunResult) -> Result<ExitCode> {
    app.emit(dry, |r| r.render_dry_run(dry, writer.is_strict()))?;
    Ok(ExitCode::SUCCESS)
}

fn show_outcome(app: &AppContext, outcome: &WriteOutcome) -> Result<ExitCode> {
    app.emit(outcome, |r| r.render_write(outcome))?;
    Ok(ExitCode::SUCCESS)
}

fn read_content(source: &Path) -> Result<String> {
    if source == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("cannot read content from stdin");
    }
    std::fs::read_to_string(source)
        .with_context(|| format!("cannot read content file {}", source.display()))
}

fn parse_object(flag: &str, raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).with_context(|| format!("{flag} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("{flag} must be a JSON object, got {other}"),
    }
}
