use serde::Deserialize;
use thiserror::Error;

/// Control-plane connection settings.
///
/// Loaded from the environment with the `FACETS_` prefix:
///   - `FACETS_CONTROL_PLANE_URL` (required)
///   - `FACETS_USERNAME`          (required)
///   - `FACETS_TOKEN`             (required)
///   - `FACETS_CONNECT_TIMEOUT`   (seconds, default 30)
///   - `FACETS_READ_TIMEOUT`      (seconds, default 300)
#[derive(Debug, Clone, Deserialize)]
pub struct ControlPlaneSettings {
    pub control_plane_url: String,
    pub username: String,
    pub token: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("control plane URL, username and token are required")]
    Incomplete,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    300
}

impl ControlPlaneSettings {
    /// Reject blank credentials and normalize the base URL.
    pub fn normalized(mut self) -> Result<Self, SettingsError> {
        if self.control_plane_url.trim().is_empty()
            || self.username.trim().is_empty()
            || self.token.trim().is_empty()
        {
            return Err(SettingsError::Incomplete);
        }
        self.control_plane_url = normalize_base_url(&self.control_plane_url);
        Ok(self)
    }
}

/// Prefix `https://` when no scheme is given and drop trailing slashes.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_string()
}
