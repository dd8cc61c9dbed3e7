//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;

/// Guarded discovery, editing and test deployment of infrastructure modules
#[derive(Parser)]
#[command(
    name = "modgenie",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Working root; nothing outside it is read or written
    #[arg(long, global = true, env = "MODGENIE_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover and read modules
    #[command(subcommand)]
    Modules(commands::modules::ModulesCommand),

    /// Preview and write module files
    #[command(subcommand)]
    Write(commands::write::WriteCommand),

    /// Run the external module tool
    #[command(subcommand)]
    Tool(commands::tool::ToolCommand),

    /// Test deployments
    #[command(subcommand)]
    Deploy(commands::deploy::DeployCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

impl Cli {
    /// Output flags, needed again in `main` to render a failure.
    #[must_use]
    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            no_color: self.no_color,
            quiet: self.quiet,
            json: self.json,
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be built or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let flags = AppFlags {
            output: self.output_flags(),
            root: self.root,
        };
        let app = AppContext::new(&flags)?;
        match self.command {
            Command::Modules(cmd) => commands::modules::run(&app, cmd).await,
            Command::Write(cmd) => commands::write::run(&app, cmd).await,
            Command::Tool(cmd) => commands::tool::run(&app, cmd).await,
            Command::Deploy(cmd) => commands::deploy::run(&app, cmd).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
        }
    }
}
