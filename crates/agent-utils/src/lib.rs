//! Shared utilities for the EV analysis agents
//!
//! This crate provides the settings singleton and logging setup used across
//! the workspace.

pub mod config;
pub mod logging;

pub use config::{ConfigError, Settings};
pub use logging::{init_tracing, init_tracing_with_level};
