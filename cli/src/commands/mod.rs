//! Command implementations

pub mod config;
pub mod deploy;
pub mod modules;
pub mod tool;
pub mod write;
