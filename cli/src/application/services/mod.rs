//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`. Filesystem access happens only on paths returned by
//! the [`PathGuard`](crate::application::guard::PathGuard).

pub mod config_service;
pub mod config_writer;
pub mod deployment;
pub mod external_tool;
pub mod module_files;
pub mod module_index;
pub mod output_types;
pub mod scanner;
