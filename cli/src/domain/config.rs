//! Domain types and validators for modgenie configuration.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "tool.binary",
    "tool.timeout_secs",
    "deploy.poll_interval_secs",
    "deploy.timeout_secs",
    "writer.strict_preview",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.facets/modgenie.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ModgenieConfig {
    pub tool: ToolConfig,
    pub deploy: DeployConfig,
    pub writer: WriterConfig,
}

/// External module tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    /// Program name or path of the module tool.
    pub binary: String,
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: "ftf".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Test deployment polling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            timeout_secs: 300,
        }
    }
}

/// Config writer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WriterConfig {
    /// Require the preview token on commit.
    pub strict_preview: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            strict_preview: true,
        }
    }
}

impl ModgenieConfig {
    /// Current value of a whitelisted key, rendered as text.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "tool.binary" => Some(self.tool.binary.clone()),
            "tool.timeout_secs" => Some(self.tool.timeout_secs.to_string()),
            "deploy.poll_interval_secs" => Some(self.deploy.poll_interval_secs.to_string()),
            "deploy.timeout_secs" => Some(self.deploy.timeout_secs.to_string()),
            "writer.strict_preview" => Some(self.writer.strict_preview.to_string()),
            _ => None,
        }
    }

    /// Validate and apply `key = value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "tool.binary" => self.tool.binary = value.trim().to_string(),
            "tool.timeout_secs" => self.tool.timeout_secs = parse_secs(key, value)?,
            "deploy.poll_interval_secs" => self.deploy.poll_interval_secs = parse_secs(key, value)?,
            "deploy.timeout_secs" => self.deploy.timeout_secs = parse_secs(key, value)?,
            "writer.strict_preview" => self.writer.strict_preview = parse_bool(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    match key {
        "tool.binary" if value.trim().is_empty() => Err(invalid(key, value, "a program name or path")),
        "tool.timeout_secs" | "deploy.poll_interval_secs" | "deploy.timeout_secs" => {
            parse_secs(key, value).map(|_| ())
        }
        "writer.strict_preview" => parse_bool(key, value).map(|_| ()),
        _ => Ok(()),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, value, "a whole number of seconds greater than 0")),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value, "true or false")),
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
