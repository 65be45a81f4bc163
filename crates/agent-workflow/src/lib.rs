//! Sequential orchestration of agents over a shared state
//!
//! A [`Workflow`] runs agents in order, merging each agent's update into the
//! shared [`agent_core::AgentState`] before the next agent starts.

pub mod workflow;

// Re-export for convenience
pub use workflow::{Workflow, WorkflowBuilder};
