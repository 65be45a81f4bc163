//! Error types for the EV agents

use thiserror::Error;

/// Errors raised by the EV market agents and their tools
#[derive(Debug, Error)]
pub enum EvError {
    /// External API answered with an error
    #[error("API error: {0}")]
    Api(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// LLM or embedding call failed
    #[error("LLM error: {0}")]
    Llm(#[from] agent_llm::LLMError),

    /// Prompt rendering failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] agent_prompt::PromptError),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query was issued before any document was indexed
    #[error("Vector index has not been built")]
    IndexNotBuilt,

    /// Market data could not be obtained
    #[error(transparent)]
    Finance(#[from] FinanceError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Errors from the financial-data tool
#[derive(Debug, Error)]
pub enum FinanceError {
    /// Every attempt returned an empty series
    #[error("No data for {ticker} after {attempts} attempts")]
    NoData { ticker: String, attempts: u32 },

    /// The last attempt failed with an error
    #[error("Fetching {ticker} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        ticker: String,
        attempts: u32,
        last_error: String,
    },

    /// Cache directory or entry could not be written
    #[error("Cache error: {0}")]
    Cache(String),

    /// The data source rejected the request
    #[error("Data source error: {0}")]
    Source(String),

    /// History length outside the representable date range
    #[error("A history of {days} days is out of range")]
    InvalidRange { days: i64 },
}

/// Result type alias for EV operations
pub type Result<T> = std::result::Result<T, EvError>;

/// Result type alias for financial-data operations
pub type FinanceResult<T> = std::result::Result<T, FinanceError>;

impl From<EvError> for agent_core::Error {
    fn from(err: EvError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}

impl From<FinanceError> for agent_core::Error {
    fn from(err: FinanceError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}

impl From<agent_core::Error> for EvError {
    fn from(err: agent_core::Error) -> Self {
        EvError::Other(err.to_string())
    }
}

impl From<agent_utils::ConfigError> for EvError {
    fn from(err: agent_utils::ConfigError) -> Self {
        EvError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FinanceError::NoData {
            ticker: "TSLA".to_string(),
            attempts: 3,
        };
        assert_eq!(err.to_string(), "No data for TSLA after 3 attempts");

        let err = EvError::from(FinanceError::RetriesExhausted {
            ticker: "005380".to_string(),
            attempts: 2,
            last_error: "timeout".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Fetching 005380 failed after 2 attempts: timeout"
        );
    }

    #[test]
    fn test_error_conversion() {
        let ev_err = EvError::Api("Tavily returned 500".to_string());
        let agent_err: agent_core::Error = ev_err.into();

        match agent_err {
            agent_core::Error::ProcessingFailed(msg) => {
                assert!(msg.contains("API error"));
            }
            _ => panic!("Expected ProcessingFailed variant"),
        }
    }
}
