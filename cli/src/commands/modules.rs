//! `modgenie modules`: discover, search and read modules under the root.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::services::module_files;
use crate::application::services::module_index::ModuleIndex;
use crate::application::services::output_types::OutputTypeCatalog;
use crate::application::services::scanner::ModuleScanner;
use crate::infra::control_plane::HttpControlPlane;
use crate::output::progress;

/// Modules subcommands.
#[derive(Subcommand)]
pub enum ModulesCommand {
    /// List every module under the working root
    List,
    /// Search modules by intent, flavor, version or description
    Search {
        /// Case-insensitive text to look for
        query: String,
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Matches per page
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },
    /// List the files of a module directory
    Files {
        /// Module directory, relative to the root
        dir: PathBuf,
    },
    /// Print one file
    Read {
        /// File path, relative to the root
        file: PathBuf,
    },
    /// List output types registered with the control plane
    OutputTypes {
        /// Only types exposing this provider source (`hashicorp/aws`)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Show one registered output type
    OutputType {
        /// Full name, `@namespace/name`
        name: String,
    },
}

/// Run the modules command.
///
/// # Errors
///
/// Returns an error if a path escapes the root or cannot be read, or if the
/// control plane cannot answer an output-type query.
pub async fn run(app: &AppContext, cmd: ModulesCommand) -> Result<ExitCode> {
    match cmd {
        ModulesCommand::List => list(app),
        ModulesCommand::Search {
            query,
            page,
            page_size,
        } => search(app, &query, page, page_size),
        ModulesCommand::Files { dir } => {
            let files = module_files::list_files(&app.guard, &dir)?;
            app.emit(&files, |r| r.render_files(&dir, &files))?;
            Ok(ExitCode::SUCCESS)
        }
        ModulesCommand::Read { file } => {
            let content = module_files::read_file(&app.guard, &file)?;
            app.emit(&content, |r| r.render_file(&content))?;
            Ok(ExitCode::SUCCESS)
        }
        ModulesCommand::OutputTypes { provider } => output_types(app, provider.as_deref()).await,
        ModulesCommand::OutputType { name } => {
            let catalog = OutputTypeCatalog::new(HttpControlPlane::from_env()?);
            let found =
                progress::with_spinner(app.show_progress(), "Fetching output type...", catalog.details(&name))
                    .await?;
            app.emit(&found, |r| r.render_output_type(&found))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn output_types(app: &AppContext, provider: Option<&str>) -> Result<ExitCode> {
    let catalog = OutputTypeCatalog::new(HttpControlPlane::from_env()?);
    let show = app.show_progress();
    let types = match provider {
        Some(source) => {
            progress::with_spinner(show, "Fetching output types...", catalog.with_provider(source)).await?
        }
        None => progress::with_spinner(show, "Fetching output types...", catalog.list()).await?,
    };
    app.emit(&types, |r| r.render_output_types(&types))?;
    Ok(ExitCode::SUCCESS)
}

fn list(app: &AppContext) -> Result<ExitCode> {
    let report = ModuleScanner::new(app.guard.clone()).scan_report();
    app.emit(&report, |r| r.render_modules(&report))?;
    Ok(ExitCode::SUCCESS)
}

fn search(app: &AppContext, query: &str, page: usize, page_size: usize) -> Result<ExitCode> {
    let mut index = ModuleIndex::new(ModuleScanner::new(app.guard.clone()));
    let results = index.search(query, page, page_size);
    app.emit(&results, |r| r.render_search(&results))?;
    Ok(ExitCode::SUCCESS)
}
