use crate::{AgentState, Result, StateUpdate};
use async_trait::async_trait;

/// One step of an analysis pipeline
///
/// `run` sees the state left by earlier agents and returns only the keys it
/// wants to change; the caller merges the update with [`AgentState::apply`].
/// An `Err` means the agent produced nothing usable.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, state: &AgentState) -> Result<StateUpdate>;

    /// Sender name used in messages and logs
    fn name(&self) -> &str;
}
