// Tool abstraction for the control loop
//
// Design decisions:
// - Tools are defined via a trait for flexibility (function-style tools)
// - Tool failures are conversational data: both outcomes render to the text
//   content of a tool_result message, never to a control-flow fault
// - An unknown tool name at dispatch is a fatal routing error

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool_types::{ToolCall, ToolDefinition};

/// Outcome of a tool execution.
///
/// `Error` is a tool-level failure the model is meant to read and react to
/// (e.g. a malformed query). It becomes the tool-result content verbatim.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Successful execution with a JSON payload
    Success(Value),
    /// Failure message, safe and useful to show the model
    Error(String),
}

impl ToolOutcome {
    /// Create a successful outcome
    pub fn success(value: impl Into<Value>) -> Self {
        ToolOutcome::Success(value.into())
    }

    /// Create a tool-level error
    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// Render the outcome as tool-result content for the transcript
    pub fn into_content(self) -> String {
        match self {
            ToolOutcome::Success(Value::String(s)) => s,
            ToolOutcome::Success(value) => {
                serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string())
            }
            ToolOutcome::Error(message) => message,
        }
    }
}

/// A named capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised to the model
    fn name(&self) -> &str;

    /// Definition (name, description, parameter schema) for the model
    fn definition(&self) -> ToolDefinition;

    /// Execute with the model-supplied arguments
    async fn execute(&self, arguments: Value) -> ToolOutcome;
}

/// Registry of bound tools, dispatching by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder-style registration
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Definitions of all bound tools, for the model-calling contract
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|tool| tool.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Check whether a tool is bound
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Dispatch one tool call and produce its tool_result message.
    ///
    /// Returns `AgentError::UnknownTool` if the requested name is not bound;
    /// every other failure mode is folded into the message content.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Message> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

        tracing::debug!(tool = %call.name, tool_call_id = %call.id, "Dispatching tool call");
        let outcome = tool.execute(call.arguments.clone()).await;
        tracing::debug!(
            tool = %call.name,
            success = outcome.is_success(),
            "Tool call completed"
        );

        Ok(Message::tool_result(
            &call.id,
            &call.name,
            outcome.into_content(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echo the input", json!({"type": "object"}))
        }

        async fn execute(&self, arguments: Value) -> ToolOutcome {
            ToolOutcome::success(arguments)
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: json!({"value": 42}),
        }
    }

    #[tokio::test]
    async fn test_dispatch_known_tool() {
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        let message = registry.dispatch(&call("echo")).await.unwrap();

        assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(message.tool_name.as_deref(), Some("echo"));
        assert_eq!(message.content, r#"{"value":42}"#);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_fatal() {
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        let err = registry.dispatch(&call("drop_tables")).await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "drop_tables"));
    }

    #[test]
    fn test_error_outcome_renders_verbatim() {
        let outcome = ToolOutcome::error("Error executing query: relation missing");
        assert_eq!(
            outcome.into_content(),
            "Error executing query: relation missing"
        );
    }

    #[test]
    fn test_string_success_is_not_requoted() {
        let outcome = ToolOutcome::success(Value::String("plain text".to_string()));
        assert_eq!(outcome.into_content(), "plain text");
    }
}
