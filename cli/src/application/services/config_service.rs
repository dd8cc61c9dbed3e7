//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::ModgenieConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the stored config cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<ModgenieConfig> {
    store.load()
}

/// Save configuration.
///
/// # Errors
///
/// Returns an error if the config cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &ModgenieConfig) -> Result<()> {
    store.save(config)
}

/// Validate, apply, and persist one `key = value` setting.
///
/// Nothing is written when validation fails.
///
/// # Errors
///
/// Returns a `ConfigError` for an unknown key or invalid value, or an I/O
/// error from the store.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<ModgenieConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    tracing::info!(key, value, "setting updated");
    Ok(config)
}
