use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An agent or tool could not finish its work
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A workflow was assembled wrongly, e.g. with no agents
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error("Invalid tool parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown tool '{name}' (available: {available})")]
    UnknownTool { name: String, available: String },

    /// A state value did not (de)serialize as the expected type
    #[error("State key '{key}': {source}")]
    StateValue {
        key: String,
        source: serde_json::Error,
    },

    /// An update could not be merged into the shared state
    #[error("Cannot merge state key '{key}': {message}")]
    StateMerge { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_value_keeps_source() {
        let source = serde_json::from_str::<Vec<String>>("{}").unwrap_err();
        let err = Error::StateValue {
            key: "companies".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("State key 'companies': invalid type"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
