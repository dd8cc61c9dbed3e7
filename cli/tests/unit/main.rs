//! Unit tests for modgenie
//!
//! Services run against hand-written port fakes and temp directories; no
//! network, no real subprocesses, no real sleeping.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod config_writer;
mod deployment_service;
mod external_tool;
mod module_files;
mod property_tests;
