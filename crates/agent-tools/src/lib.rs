//! Callable tools for the EV analysis agents
//!
//! A [`Tool`] takes JSON parameters and answers with JSON. Tools are looked
//! up by name through a [`ToolRegistry`], which checks required parameters
//! against each tool's input schema before running it.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolDefinition};
