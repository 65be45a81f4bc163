//! Errors from LLM and embedding providers

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Error, Debug)]
pub enum LLMError {
    /// Provider is misconfigured, e.g. an empty API key
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The provider rejected or failed the request
    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// The answer could not be understood
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl LLMError {
    /// Error for a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed,
            429 => Self::RateLimitExceeded(body),
            _ => Self::RequestFailed {
                status,
                message: body,
            },
        }
    }

    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) => true,
            Self::RequestFailed { status, .. } => *status >= 500,
            #[cfg(feature = "openai")]
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            LLMError::from_status(401, String::new()),
            LLMError::AuthenticationFailed
        ));
        assert!(LLMError::from_status(429, "slow down".into()).is_transient());
        assert!(LLMError::from_status(503, "overloaded".into()).is_transient());

        let bad_request = LLMError::from_status(400, "unknown model".into());
        assert!(!bad_request.is_transient());
        assert_eq!(bad_request.to_string(), "Request failed (400): unknown model");
    }
}
