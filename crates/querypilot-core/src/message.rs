// Conversation messages and the transcript
//
// Message is a DB-agnostic representation of a single entry in the
// conversation history. Transcript is the ordered, append-only sequence of
// messages with merge-by-identity semantics: storing a message whose id is
// already present replaces the earlier entry in place instead of duplicating
// it. This lets the loop substitute a fallback answer that keeps the id of
// the model's raw response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool_types::ToolCall;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// System message (instructions, injected per model call)
    System,
    /// User message
    User,
    /// Assistant response (may carry tool calls)
    Assistant,
    /// Tool execution result
    ToolResult,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Message role
    pub role: MessageRole,

    /// Text content
    pub content: String,

    /// Tool calls requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Tool call ID (for tool_result messages, correlates with the
    /// originating assistant tool call)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Name of the tool that produced a tool_result message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::User,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new assistant message with tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            tool_name: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::System,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            created_at: Utc::now(),
        }
    }

    /// Create a tool result message
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::ToolResult,
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
            created_at: Utc::now(),
        }
    }

    /// Check if this message has tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|tc| !tc.is_empty())
    }
}

/// Ordered conversation history with merge-by-identity semantics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a message into the transcript.
    ///
    /// A message whose id matches an existing entry replaces it in place;
    /// otherwise the message is appended in arrival order.
    pub fn merge(&mut self, message: Message) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
        } else {
            self.messages.push(message);
        }
    }

    /// Merge a batch of messages in order
    pub fn merge_all(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.merge(message);
        }
    }

    /// All messages in arrival order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        let mut transcript = Transcript::new();
        transcript.merge_all(messages);
        transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("What is the total revenue?");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "What is the total revenue?");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_assistant_with_tools() {
        let msg = Message::assistant_with_tools(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "get_schema".to_string(),
                arguments: serde_json::json!({}),
            }],
        );
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn test_tool_result_message() {
        let msg = Message::tool_result("call_123", "run_query", "[]");
        assert_eq!(msg.role, MessageRole::ToolResult);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_123"));
        assert_eq!(msg.tool_name.as_deref(), Some("run_query"));
    }

    #[test]
    fn test_transcript_appends_in_order() {
        let mut transcript = Transcript::new();
        transcript.merge(Message::user("one"));
        transcript.merge(Message::assistant("two"));

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content, "one");
        assert_eq!(transcript.last().unwrap().content, "two");
    }

    #[test]
    fn test_transcript_replaces_by_id() {
        let mut transcript = Transcript::new();
        let original = Message::assistant("draft answer");
        let id = original.id;
        transcript.merge(Message::user("question"));
        transcript.merge(original);

        let mut replacement = Message::assistant("final answer");
        replacement.id = id;
        transcript.merge(replacement);

        // Replaced in place: count unchanged, content updated, order kept
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[1].id, id);
        assert_eq!(transcript.messages()[1].content, "final answer");
    }
}
