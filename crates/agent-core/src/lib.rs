//! Core abstractions for the EV analysis agents
//!
//! This crate defines the [`Agent`] trait and the shared [`AgentState`] that
//! agents read from and update.

pub mod agent;
pub mod error;
pub mod state;

pub use agent::Agent;
pub use error::{Error, Result};
pub use state::{AgentMessage, AgentState, Reducer, StateSchema, StateUpdate};
