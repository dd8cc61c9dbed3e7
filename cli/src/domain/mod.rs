//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod catalog;
pub mod config;
pub mod deployment;
pub mod descriptor;
pub mod diff;
pub mod error;
pub mod files;
pub mod outputs;

#[allow(unused_imports)]
pub use catalog::{ModuleCatalogEntry, ScanFailure, ScanReport, SearchPage, search_page};
#[allow(unused_imports)]
pub use config::{ModgenieConfig, validate_config_key, validate_config_value};
#[allow(unused_imports)]
pub use deployment::{DeploymentRecord, DeploymentRef, DeploymentRequest, DeploymentStatus};
#[allow(unused_imports)]
pub use descriptor::{DESCRIPTOR_FILE, ModuleDescriptor, ModuleRef};
#[allow(unused_imports)]
pub use error::{
    ConfigError, DeployError, GuardError, ToolError, TransitionError, WriteError, error_code,
};
#[allow(unused_imports)]
pub use files::FileRole;
