//! Workflow definition and execution

use agent_core::{Agent, AgentState, Result, StateUpdate};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};

/// A workflow that runs agents one after another over a shared state
///
/// Each agent sees the state produced by the agents before it. Its update is
/// merged with [`AgentState::apply`] before the next agent starts.
///
/// # Example
///
/// ```no_run
/// use agent_core::AgentState;
/// use agent_workflow::Workflow;
/// use std::sync::Arc;
///
/// # async fn example(
/// #     market: Arc<dyn agent_core::Agent>,
/// #     company: Arc<dyn agent_core::Agent>,
/// # ) -> agent_core::Result<()> {
/// let workflow = Workflow::builder()
///     .add_agent(market)
///     .add_agent(company)
///     .build()?;
///
/// let state = workflow
///     .execute(AgentState::new().with_user_request("EV market outlook"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Workflow {
    steps: Vec<Arc<dyn Agent>>,
    stop_on_error: bool,
}

impl Workflow {
    /// Create a new workflow builder
    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::new()
    }

    /// Names of the agents in execution order
    pub fn agent_names(&self) -> Vec<&str> {
        self.steps.iter().map(|agent| agent.name()).collect()
    }

    /// Run every agent in order and return the final state
    ///
    /// An agent error becomes an error update (see [`StateUpdate::failure`])
    /// and the workflow moves on, unless `stop_on_error` is set. A merge
    /// error always aborts.
    pub async fn execute(&self, mut state: AgentState) -> Result<AgentState> {
        let total = self.steps.len();

        for (index, agent) in self.steps.iter().enumerate() {
            let span = info_span!("workflow_step", step = index + 1, agent = agent.name());
            let outcome = async {
                info!("Running step {}/{}", index + 1, total);
                agent.run(&state).await
            }
            .instrument(span)
            .await;

            let update = match outcome {
                Ok(update) => update,
                Err(e) if self.stop_on_error => {
                    error!(agent = agent.name(), "Agent failed, stopping workflow: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    error!(agent = agent.name(), "Agent failed: {}", e);
                    StateUpdate::failure(agent.name(), &e)
                }
            };

            state.apply(update)?;
        }

        Ok(state)
    }
}

/// Builder for constructing workflows
#[derive(Default)]
pub struct WorkflowBuilder {
    steps: Vec<Arc<dyn Agent>>,
    stop_on_error: bool,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent to the workflow
    pub fn add_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.steps.push(agent);
        self
    }

    /// Abort on the first agent error instead of recording it
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Build the workflow
    pub fn build(self) -> Result<Workflow> {
        if self.steps.is_empty() {
            return Err(agent_core::Error::InvalidWorkflow(
                "no agents added".to_string(),
            ));
        }
        Ok(Workflow {
            steps: self.steps,
            stop_on_error: self.stop_on_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::state::keys;
    use async_trait::async_trait;
    use serde_json::json;

    /// Appends a company and records how many companies it saw
    struct CompanyAgent {
        name: &'static str,
        company: &'static str,
    }

    #[async_trait]
    impl Agent for CompanyAgent {
        async fn run(&self, state: &AgentState) -> Result<StateUpdate> {
            let seen = state.string_list(keys::COMPANIES).len();
            Ok(StateUpdate::new()
                .set(keys::COMPANIES, json!([self.company]))
                .set("seen", json!(seen))
                .push_message(self.name, format!("added {}", self.company)))
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        async fn run(&self, _state: &AgentState) -> Result<StateUpdate> {
            Err(agent_core::Error::ProcessingFailed("search unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_agents_see_previous_updates() {
        let workflow = Workflow::builder()
            .add_agent(Arc::new(CompanyAgent {
                name: "first",
                company: "Tesla",
            }))
            .add_agent(Arc::new(CompanyAgent {
                name: "second",
                company: "BYD",
            }))
            .build()
            .unwrap();

        assert_eq!(workflow.agent_names(), vec!["first", "second"]);

        let state = workflow.execute(AgentState::new()).await.unwrap();
        assert_eq!(state.string_list(keys::COMPANIES), vec!["Tesla", "BYD"]);
        // Overwritten by the second agent, which saw one company
        assert_eq!(state.get("seen"), Some(&json!(1)));
        assert_eq!(state.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_recorded_and_workflow_continues() {
        let workflow = Workflow::builder()
            .add_agent(Arc::new(FailingAgent))
            .add_agent(Arc::new(CompanyAgent {
                name: "after",
                company: "CATL",
            }))
            .build()
            .unwrap();

        let state = workflow.execute(AgentState::new()).await.unwrap();
        assert_eq!(state.get(keys::AGENT), Some(&json!("failing")));
        assert!(
            state
                .get(keys::ERROR)
                .and_then(|v| v.as_str())
                .unwrap()
                .contains("search unavailable")
        );
        assert_eq!(state.string_list(keys::COMPANIES), vec!["CATL"]);
    }

    #[tokio::test]
    async fn test_stop_on_error() {
        let workflow = Workflow::builder()
            .add_agent(Arc::new(FailingAgent))
            .stop_on_error(true)
            .build()
            .unwrap();

        assert!(workflow.execute(AgentState::new()).await.is_err());
    }

    #[test]
    fn test_empty_workflow_rejected() {
        assert!(Workflow::builder().build().is_err());
    }
}
