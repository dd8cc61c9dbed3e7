//! `modgenie config`: show and set configuration values.

use anyhow::Result;
use std::process::ExitCode;

use clap::Subcommand;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;
use crate::domain::config::ModgenieConfig;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Serialize)]
struct ConfigView<'a> {
    path: String,
    #[serde(flatten)]
    config: &'a ModgenieConfig,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error for an unknown key, an invalid value, or when the
/// settings file cannot be read or written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    let view = ConfigView {
        path: path.display().to_string(),
        config: &config,
    };
    app.emit(&view, |r| r.render_config(&config, &path))?;
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    let config = config_service::set_value(&app.config_store, key, value)?;
    let view = ConfigView {
        path: app.config_store.path()?.display().to_string(),
        config: &config,
    };
    app.emit(&view, |_| app.output.success(&format!("Set {key} = {value}")))?;
    Ok(ExitCode::SUCCESS)
}
