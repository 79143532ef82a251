// LLM driver abstraction
//
// LlmDriver is the provider-agnostic chat-completion interface with
// tool-calling support. Implementations handle provider-specific API calls
// and response parsing; the loop only sees assistant Messages.

use async_trait::async_trait;

use crate::config::AgentConfig;
use crate::error::Result;
use crate::message::{Message, MessageRole};
use crate::tool_types::{ToolCall, ToolDefinition};

/// Message format for LLM calls (provider-agnostic)
#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: LlmMessageRole,
    pub content: String,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_call_id: Option<String>,
}

impl LlmMessage {
    /// Create a message with text content
    pub fn text(role: LlmMessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Message role for LLM calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmMessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Configuration for a single LLM call
#[derive(Debug, Clone)]
pub struct LlmCallConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Vec<ToolDefinition>,
}

impl From<&AgentConfig> for LlmCallConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            tools: config.tools.clone(),
        }
    }
}

/// Response from an LLM call
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The assistant message, possibly carrying tool calls
    pub message: Message,
}

/// Trait for LLM drivers
#[async_trait]
pub trait LlmDriver: std::fmt::Debug + Send + Sync {
    /// Run one chat completion and return exactly one assistant message
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse>;
}

/// Allow dynamic dispatch through a boxed driver
#[async_trait]
impl LlmDriver for Box<dyn LlmDriver> {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        (**self).chat_completion(messages, config).await
    }
}

impl From<&Message> for LlmMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => LlmMessageRole::System,
            MessageRole::User => LlmMessageRole::User,
            MessageRole::Assistant => LlmMessageRole::Assistant,
            MessageRole::ToolResult => LlmMessageRole::Tool,
        };

        LlmMessage {
            role,
            content: msg.content.clone(),
            tool_calls: msg.tool_calls.clone(),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}
