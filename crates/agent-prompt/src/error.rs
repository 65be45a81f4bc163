use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Unknown report language '{0}' (expected 'en' or 'ko')")]
    UnknownLanguage(String),

    #[error("Prompt '{0}' is not registered")]
    NotRegistered(String),

    /// Syntax error at registration or a failure while rendering
    #[error("Prompt '{name}': {source}")]
    Template {
        name: String,
        source: minijinja::Error,
    },
}

#[cfg(feature = "core-integration")]
impl From<PromptError> for agent_core::Error {
    fn from(err: PromptError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}
