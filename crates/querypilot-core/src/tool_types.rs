// Tool wire types
//
// Design Decision: Tools are identified by name (string) for extensibility.
// Tool execution happens via the ToolRegistry which looks up tools by name.

use serde::{Deserialize, Serialize};

/// Wire name of the schema-introspection tool
pub const GET_SCHEMA_TOOL: &str = "get_schema";

/// Wire name of the query-execution tool; dispatches of this tool consume
/// the per-thread query-attempt budget
pub const RUN_QUERY_TOOL: &str = "run_query";

/// Progress line published while a query is executing
pub const RUNNING_QUERY_PROGRESS: &str = "Running query...";

/// Tool definition advertised to the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (used by LLM and for registry lookup)
    pub name: String,
    /// Tool description for the LLM
    pub description: String,
    /// JSON schema for tool parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Tool call from an LLM response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call (assigned by the provider)
    pub id: String,
    /// Tool name to execute
    pub name: String,
    /// Arguments as JSON
    pub arguments: serde_json::Value,
}
