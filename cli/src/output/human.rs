//! Human-readable terminal renderer.

use std::path::{Path, PathBuf};

use modgenie_common::{OutputType, Stack};
use owo_colors::OwoColorize as _;

use crate::application::services::config_writer::{DryRunResult, WriteOutcome};
use crate::application::services::external_tool::ToolOutcome;
use crate::application::services::module_files::FileContent;
use crate::domain::catalog::{ModuleCatalogEntry, ScanReport, SearchPage};
use crate::domain::config::{ModgenieConfig, VALID_CONFIG_KEYS};
use crate::domain::deployment::{DeploymentRecord, DeploymentStatus};
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    // ── modules ──────────────────────────────────────────────────────────────

    /// Render a full scan: modules first, then per-module failures.
    pub fn render_modules(&self, report: &ScanReport) {
        if report.entries.is_empty() {
            self.ctx.info("No modules found.");
        } else {
            self.ctx.header(&format!("Modules ({}):", report.entries.len()));
            for entry in &report.entries {
                self.module_line(entry);
            }
        }
        if !report.failures.is_empty() {
            println!();
            for failure in &report.failures {
                self.ctx
                    .warn(&format!("{}: {}", failure.path.display(), failure.reason));
            }
        }
    }

    /// Render one page of search results.
    pub fn render_search(&self, page: &SearchPage) {
        if page.matches.is_empty() {
            self.ctx.info(&format!(
                "No modules on page {} ({} total matches).",
                page.page, page.total_count
            ));
            return;
        }
        self.ctx.header(&format!(
            "Matches {}-{} of {}:",
            page.page * page.page_size + 1,
            page.page * page.page_size + page.matches.len(),
            page.total_count
        ));
        for entry in &page.matches {
            self.module_line(entry);
        }
        if page.has_more {
            self.ctx
                .info(&format!("More results: --page {}", page.page + 1));
        }
    }

    fn module_line(&self, entry: &ModuleCatalogEntry) {
        let d = &entry.descriptor;
        let outputs = if entry.output_interface.is_some() {
            " [outputs]"
        } else {
            ""
        };
        self.ctx.kv(
            &format!("{}/{}/{}", d.intent, d.flavor, d.version),
            &format!("{}{outputs}", entry.module_path.display()),
        );
    }

    /// Render a module's file listing.
    pub fn render_files(&self, dir: &Path, files: &[PathBuf]) {
        self.ctx
            .header(&format!("{} ({} files):", dir.display(), files.len()));
        for f in files {
            if !self.ctx.quiet {
                println!("    {}", f.display());
            }
        }
    }

    /// Print a file's content verbatim.
    pub fn render_file(&self, file: &FileContent) {
        print!("{}", file.content);
        if !file.content.ends_with('\n') && !file.content.is_empty() {
            println!();
        }
    }

    /// Render registered output types, one per line.
    pub fn render_output_types(&self, types: &[OutputType]) {
        if types.is_empty() {
            self.ctx.info("No output types registered.");
            return;
        }
        self.ctx.header(&format!("Output types ({}):", types.len()));
        if self.ctx.quiet {
            return;
        }
        for t in types {
            match &t.description {
                Some(d) if !d.is_empty() => {
                    println!("    {}  {}", t.full_name(), d.style(self.ctx.styles.dim));
                }
                _ => println!("    {}", t.full_name()),
            }
        }
    }

    /// Render one output type and its providers.
    pub fn render_output_type(&self, output_type: &OutputType) {
        self.ctx.header(&output_type.full_name());
        if self.ctx.quiet {
            return;
        }
        if let Some(d) = &output_type.description {
            println!("  {d}");
        }
        if output_type.providers.is_empty() {
            println!("  Providers: none");
            return;
        }
        println!("  Providers:");
        for p in &output_type.providers {
            let version = p.version.as_deref().unwrap_or("any");
            println!("    {} ({}, {version})", p.name, p.source);
        }
    }

    // ── writer ───────────────────────────────────────────────────────────────

    /// Render a dry run: diff, problems, and the token to commit with.
    pub fn render_dry_run(&self, dry: &DryRunResult, strict: bool) {
        let what = if dry.exists { "update" } else { "create" };
        self.ctx.header(&format!(
            "Preview: {what} {} (+{} -{})",
            dry.path.display(),
            dry.lines_added,
            dry.lines_removed
        ));
        if dry.diff.is_empty() {
            self.ctx.info("No changes.");
        } else {
            self.print_diff(&dry.diff);
        }
        if dry.valid {
            self.ctx.success("Content is valid.");
        } else {
            for problem in &dry.problems {
                self.ctx.warn(problem);
            }
        }
        if strict && dry.valid {
            self.ctx.kv("Token:", &dry.preview_token);
        }
    }

    fn print_diff(&self, diff: &str) {
        for line in diff.lines() {
            if line.starts_with("+++") || line.starts_with("---") || line.starts_with("@@") {
                println!("{}", line.style(self.ctx.styles.dim));
            } else if line.starts_with('+') {
                println!("{}", line.style(self.ctx.styles.added));
            } else if line.starts_with('-') {
                println!("{}", line.style(self.ctx.styles.removed));
            } else {
                println!("{line}");
            }
        }
    }

    /// Render a commit result.
    pub fn render_write(&self, outcome: &WriteOutcome) {
        if outcome.changed {
            self.ctx.success(&format!(
                "Wrote {} ({} bytes, +{} -{})",
                outcome.path.display(),
                outcome.bytes_written,
                outcome.lines_added,
                outcome.lines_removed
            ));
        } else {
            self.ctx
                .info(&format!("{} already up to date.", outcome.path.display()));
        }
    }

    // ── tool ─────────────────────────────────────────────────────────────────

    /// Render a successful tool run.
    pub fn render_tool(&self, outcome: &ToolOutcome) {
        self.ctx.success(&outcome.command);
        let out = outcome.stdout.trim_end();
        if !out.is_empty() && !self.ctx.quiet {
            println!("{out}");
        }
    }

    // ── deploy ───────────────────────────────────────────────────────────────

    /// Render the test projects.
    pub fn render_projects(&self, projects: &[Stack]) {
        if projects.is_empty() {
            self.ctx.info("No projects accept preview modules.");
            return;
        }
        self.ctx.header("Test projects:");
        for p in projects {
            if !self.ctx.quiet {
                println!("    {}", p.name);
            }
        }
    }

    /// Render a deployment record.
    pub fn render_deployment(&self, record: &DeploymentRecord) {
        let status = record.status.to_string();
        let styled = match record.status {
            DeploymentStatus::Succeeded => status.style(self.ctx.styles.success).to_string(),
            DeploymentStatus::Failed => status.style(self.ctx.styles.error).to_string(),
            DeploymentStatus::TimedOut => status.style(self.ctx.styles.warning).to_string(),
            _ => status.style(self.ctx.styles.info).to_string(),
        };
        self.ctx.kv("Status:", &styled);
        if !record.id.is_empty() {
            self.ctx.kv("Deployment:", &record.id);
        }
        if let Some(cluster) = &record.cluster_id {
            self.ctx.kv("Environment:", cluster);
        }
        if let Some(module) = &record.module {
            self.ctx.kv("Module:", &module.to_string());
        }
        if let Some(artifact) = &record.artifact {
            self.ctx.kv("Artifact:", artifact);
        }
        if !record.resources.is_empty() {
            self.ctx.kv("Resources:", &record.resources.join(", "));
        }
        if let Some(remote) = &record.remote_status {
            self.ctx.kv("Remote:", remote);
        }
        if let Some(err) = &record.error {
            self.ctx.warn(err);
        }
        if record.status == DeploymentStatus::TimedOut
            && let Some(handle) = record.handle()
        {
            self.ctx.info(&format!(
                "Still running remotely. Check again: modgenie deploy status --cluster {} --deployment {}",
                handle.cluster_id, handle.deployment_id
            ));
        }
    }

    /// Print log lines verbatim.
    pub fn render_logs(&self, lines: &[String]) {
        if lines.is_empty() {
            self.ctx.info("No logs yet.");
            return;
        }
        for line in lines {
            println!("{line}");
        }
    }

    // ── config ───────────────────────────────────────────────────────────────

    /// Render every setting and where it is stored.
    pub fn render_config(&self, config: &ModgenieConfig, path: &Path) {
        self.ctx.header("Configuration:");
        for key in VALID_CONFIG_KEYS {
            if let Some(value) = config.get(key) {
                self.ctx.kv(&format!("{key}:"), &value);
            }
        }
        self.ctx.kv("File:", &path.display().to_string());
    }
}
