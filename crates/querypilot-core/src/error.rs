// Error types for the agent core

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while driving a conversation
///
/// Database failures are deliberately absent from this taxonomy: the tool
/// layer converts them into tool-result text so the model can read and react
/// to them. Every variant here is unrecoverable within a single invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// A non-assistant message arrived where an assistant message was expected
    #[error("Unexpected message kind: expected assistant, got {0}")]
    UnexpectedMessageKind(String),

    /// Missing or invalid provider configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model requested a tool that is not in the bound set
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// State store error
    #[error("State store error: {0}")]
    Store(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AgentError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        AgentError::Llm(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }

    /// Create a state store error
    pub fn store(msg: impl Into<String>) -> Self {
        AgentError::Store(msg.into())
    }
}
