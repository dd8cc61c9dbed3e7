//! JSON output helpers.
//!
//! `--json` writes exactly one pretty-printed document to stdout: the command
//! result on success, or the error object from [`format_error`] on failure.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::error::error_code;

/// Renders command results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print `value` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{text}");
        Ok(())
    }
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format any error from this crate with its stable code.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_anyhow(err: &anyhow::Error) -> Result<String> {
    format_error(&format!("{err:#}"), error_code(err))
}
