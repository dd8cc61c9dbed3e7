pub mod config;
pub mod types;

pub use config::{ControlPlaneSettings, SettingsError, normalize_base_url};
pub use types::*;
