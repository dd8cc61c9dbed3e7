//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Each enum exposes a stable `code()` used by the JSON
//! renderer.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::deployment::DeploymentStatus;

// ── Path guard errors ─────────────────────────────────────────────────────────

/// Errors raised while resolving a path against the working root.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("'{}' resolves outside the working directory {}", path.display(), root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    #[error("'{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("cannot resolve '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GuardError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PathEscape { .. } => "path_escape",
            Self::NotFound(_) => "not_found",
            Self::Io { .. } => "io_error",
        }
    }
}

// ── Config writer errors ──────────────────────────────────────────────────────

/// Errors raised by the guarded config writer.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("'{name}' cannot be written through this path. {hint}")]
    ProtectedFile { name: String, hint: &'static str },

    #[error("invalid content for '{file}':\n{reason}")]
    InvalidContent { file: String, reason: String },

    #[error("no matching preview for '{0}'. Run a preview and pass its token to commit.")]
    NotPreviewed(String),

    #[error("writing '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Guard(e) => e.code(),
            Self::ProtectedFile { .. } => "protected_file",
            Self::InvalidContent { .. } => "invalid_content",
            Self::NotPreviewed(_) => "not_previewed",
            Self::Io { .. } => "io_error",
        }
    }
}

// ── External tool errors ──────────────────────────────────────────────────────

/// Structured outcome of a failed external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("validation failed ({command}):\n{stderr}")]
    ValidationFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("generation failed ({command}):\n{stderr}")]
    GenerationFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("{program} is unavailable: {reason}")]
    Unavailable { program: String, reason: String },
}

impl ToolError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Guard(e) => e.code(),
            Self::ValidationFailed { .. } => "validation_failed",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::Unavailable { .. } => "tool_unavailable",
        }
    }
}

// ── Deployment errors ─────────────────────────────────────────────────────────

/// Errors surfaced by the deployment orchestrator.
///
/// None of these change a record's last known status.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("status check for deployment '{deployment}' failed: {reason}")]
    Poll { deployment: String, reason: String },

    #[error("fetching logs for deployment '{deployment}' failed: {reason}")]
    Logs { deployment: String, reason: String },

    #[error("control plane request failed: {0}")]
    ControlPlane(String),
}

impl DeployError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Poll { .. } => "poll_error",
            Self::Logs { .. } => "logs_error",
            Self::ControlPlane(_) => "control_plane_error",
        }
    }
}

// ── Output type errors ────────────────────────────────────────────────────────

/// Errors from output-type lookups against the control plane.
#[derive(Debug, Error)]
pub enum OutputTypeError {
    #[error("'{0}' is not an output type name; expected @namespace/name")]
    InvalidName(String),

    #[error("output type '{0}' is not registered")]
    NotFound(String),

    #[error("control plane request failed: {0}")]
    ControlPlane(String),
}

impl OutputTypeError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "invalid_output_type",
            Self::NotFound(_) => "output_type_not_found",
            Self::ControlPlane(_) => "control_plane_error",
        }
    }
}

/// Rejected deployment status change.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("deployment cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: DeploymentStatus,
    pub to: DeploymentStatus,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}

impl ConfigError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownKey { .. } => "unknown_setting",
            Self::InvalidValue { .. } => "invalid_setting",
        }
    }
}

/// Map any error produced by this crate to its stable code.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<GuardError>() {
        return e.code();
    }
    if let Some(e) = err.downcast_ref::<WriteError>() {
        return e.code();
    }
    if let Some(e) = err.downcast_ref::<ToolError>() {
        return e.code();
    }
    if let Some(e) = err.downcast_ref::<DeployError>() {
        return e.code();
    }
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return e.code();
    }
    if let Some(e) = err.downcast_ref::<OutputTypeError>() {
        return e.code();
    }
    if err.downcast_ref::<TransitionError>().is_some() {
        return "invalid_transition";
    }
    "internal"
}
