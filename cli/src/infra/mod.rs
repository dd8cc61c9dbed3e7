//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains the I/O that sits behind ports: process execution,
//! the control-plane HTTP client, the clock, and the config file.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod clock;
pub mod command_runner;
pub mod config;
pub mod control_plane;
