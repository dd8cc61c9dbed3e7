//! Application service: the external module tool (`ftf`).
//!
//! Every subprocess, the `git` lookups included, goes through
//! [`ExternalTool::invoke`]. A non-zero exit becomes a typed [`ToolError`]
//! carrying stderr; nothing here retries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::application::guard::PathGuard;
use crate::application::ports::CommandRunner;
use crate::application::services::module_files;
use crate::domain::config::ToolConfig;
use crate::domain::error::{GuardError, ToolError};
use crate::domain::files::provider_block_lines;

/// Captured result of one subprocess run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolOutcome {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Arguments for `generate-module`.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub intent: String,
    pub flavor: String,
    pub cloud: String,
    pub title: String,
    pub description: String,
    /// Parent directory for the new module, relative to the working root.
    pub directory: PathBuf,
}

/// Flags for `preview-module`.
#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    pub profile: Option<String>,
    pub auto_create_intent: bool,
    pub publishable: bool,
    /// Overrides the `remote.origin.url` lookup.
    pub git_url: Option<String>,
    /// Overrides the current-branch lookup.
    pub git_ref: Option<String>,
    pub publish: bool,
}

/// Repository details passed to `preview-module`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitInfo {
    pub url: Option<String>,
    pub reference: Option<String>,
}

/// Adapter around the module tool binary.
pub struct ExternalTool<R: CommandRunner> {
    runner: R,
    guard: PathGuard,
    program: String,
    timeout: Duration,
}

impl<R: CommandRunner> ExternalTool<R> {
    pub fn new(runner: R, guard: PathGuard, config: &ToolConfig) -> Self {
        Self {
            runner,
            guard,
            program: config.binary.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run `program args...` in `cwd`, which must be inside the working root.
    ///
    /// A non-zero exit is still `Ok`; callers decide what failure means.
    ///
    /// # Errors
    ///
    /// `PathEscape`/`NotFound` for `cwd` and `Unavailable` when the process
    /// cannot be started or exceeds the timeout.
    pub async fn invoke(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
    ) -> Result<ToolOutcome, ToolError> {
        let cwd = self.guard.resolve(cwd)?;
        let command = render_command(program, args);
        tracing::debug!(%command, cwd = %cwd.display(), "invoking subprocess");

        let output = self
            .runner
            .run_in(program, args, &cwd, self.timeout)
            .await
            .map_err(|e| ToolError::Unavailable {
                program: program.to_string(),
                reason: format!("{e:#}"),
            })?;

        let outcome = ToolOutcome {
            command,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command = %outcome.command, exit_code = ?outcome.exit_code, "subprocess finished");
        Ok(outcome)
    }

    /// `validate-directory <dir> [--check-only]`, after a provider-block check.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when a `.tf` file declares a provider block or the
    /// tool exits non-zero.
    pub async fn validate(&self, module_dir: &Path, check_only: bool) -> Result<ToolOutcome, ToolError> {
        let dir = self.guard.resolve(module_dir)?;
        let offenders = self.provider_block_files(&dir)?;
        if !offenders.is_empty() {
            return Err(ToolError::ValidationFailed {
                command: "provider block check".to_string(),
                stdout: String::new(),
                stderr: format!(
                    "provider blocks are not allowed in module files; the platform supplies providers:\n  - {}",
                    offenders.join("\n  - ")
                ),
            });
        }

        let dir_arg = dir.to_string_lossy().into_owned();
        let mut args = vec!["validate-directory", dir_arg.as_str()];
        if check_only {
            args.push("--check-only");
        }
        let outcome = self.invoke(&self.program, &args, &dir).await?;
        if !outcome.success() {
            return Err(ToolError::ValidationFailed {
                command: outcome.command,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            });
        }
        Ok(outcome)
    }

    /// `generate-module -i -f -c -t -d <dir>`.
    ///
    /// # Errors
    ///
    /// `GenerationFailed` on a non-zero exit.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ToolOutcome, ToolError> {
        let dir = self.guard.resolve(&request.directory)?;
        let dir_arg = dir.to_string_lossy().into_owned();
        let args = [
            "generate-module",
            "-i",
            request.intent.as_str(),
            "-f",
            request.flavor.as_str(),
            "-c",
            request.cloud.as_str(),
            "-t",
            request.title.as_str(),
            "-d",
            request.description.as_str(),
            dir_arg.as_str(),
        ];
        let outcome = self.invoke(&self.program, &args, &dir).await?;
        generation_result(outcome)
    }

    /// `preview-module <dir> [flags]`, filling in git details when not given.
    ///
    /// # Errors
    ///
    /// `GenerationFailed` on a non-zero exit.
    pub async fn preview(&self, module_dir: &Path, options: &PreviewOptions) -> Result<ToolOutcome, ToolError> {
        let dir = self.guard.resolve(module_dir)?;
        let discovered = if options.git_url.is_none() || options.git_ref.is_none() {
            self.git_info(&dir).await
        } else {
            GitInfo::default()
        };
        let git_url = options.git_url.clone().or(discovered.url);
        let git_ref = options.git_ref.clone().or(discovered.reference);

        let dir_arg = dir.to_string_lossy().into_owned();
        let mut args: Vec<&str> = vec!["preview-module", dir_arg.as_str()];
        if let Some(profile) = &options.profile {
            args.extend(["-p", profile.as_str()]);
        }
        if options.auto_create_intent {
            args.push("-a");
        }
        if options.publishable {
            args.push("-f");
        }
        if let Some(url) = &git_url {
            args.extend(["-g", url.as_str()]);
        }
        if let Some(reference) = &git_ref {
            args.extend(["-r", reference.as_str()]);
        }
        if options.publish {
            args.push("--publish");
        }
        let outcome = self.invoke(&self.program, &args, &dir).await?;
        generation_result(outcome)
    }

    /// Origin URL and current branch of the repository holding `dir`.
    ///
    /// Lookup failures leave the field empty.
    pub async fn git_info(&self, dir: &Path) -> GitInfo {
        GitInfo {
            url: self.git_value(dir, &["config", "--get", "remote.origin.url"]).await,
            reference: self.git_value(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await,
        }
    }

    async fn git_value(&self, dir: &Path, args: &[&str]) -> Option<String> {
        match self.invoke("git", args, dir).await {
            Ok(o) if o.success() => Some(o.stdout.trim().to_string()).filter(|s| !s.is_empty()),
            Ok(o) => {
                tracing::debug!(command = %o.command, stderr = %o.stderr.trim(), "git lookup failed");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "git unavailable");
                None
            }
        }
    }

    /// `file:line` for every provider block in the module's `.tf` files.
    ///
    /// A `.tf` symlink whose target lies outside the working root is skipped
    /// with a warning: it is not part of the module tree the guard covers, so
    /// it is neither read nor reported.
    fn provider_block_files(&self, dir: &Path) -> Result<Vec<String>, ToolError> {
        let mut offenders = Vec::new();
        for rel in module_files::list_files(&self.guard, dir)? {
            if rel.extension().is_none_or(|ext| ext != "tf") {
                continue;
            }
            let file = match module_files::read_file(&self.guard, dir.join(&rel)) {
                Ok(file) => file,
                Err(GuardError::PathEscape { .. }) => {
                    tracing::warn!(file = %rel.display(), "skipping .tf file that resolves outside the working root");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            for line in provider_block_lines(&file.content) {
                offenders.push(format!("{}:{line}", rel.display()));
            }
        }
        Ok(offenders)
    }
}

fn generation_result(outcome: ToolOutcome) -> Result<ToolOutcome, ToolError> {
    if outcome.success() {
        Ok(outcome)
    } else {
        Err(ToolError::GenerationFailed {
            command: outcome.command,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
        })
    }
}

fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|a| {
            if a.is_empty() || a.contains(char::is_whitespace) {
                format!("'{a}'")
            } else {
                a.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
