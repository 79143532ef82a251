// Querypilot core
//
// This crate provides a DB-agnostic implementation of the conversational
// analytics control loop: an explicit state machine that alternates between
// model turns and tool turns until a termination condition fires.
//
// Key design decisions:
// - The routing policy is a pure transition function (router), independently
//   testable without an LLM or a database
// - Traits (StateStore, ProgressSink, Tool, LlmDriver) keep the backends
//   pluggable; in-memory implementations live in `memory`
// - Tool failures are conversational data: they become tool-result text the
//   model can react to, bounded by the per-thread query-attempt cap
// - Provider selection is a closed tagged enum resolved once at startup

pub mod anthropic;
pub mod config;
pub mod error;
pub mod events;
pub mod llm;
pub mod r#loop;
pub mod message;
pub mod openai;
pub mod provider_factory;
pub mod router;
pub mod state;
pub mod tool_types;
pub mod tools;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use events::AgentEvent;
pub use message::{Message, MessageRole, Transcript};
pub use r#loop::AgentLoop;
pub use router::{transition, LoopState, Transition, TurnEvent, FALLBACK_ANSWER};
pub use state::{AgentState, DEFAULT_STEP_BUDGET, MAX_QUERY_ATTEMPTS};
pub use memory::{CollectingProgressSink, InMemoryStateStore};
pub use tools::{Tool, ToolOutcome, ToolRegistry};
pub use traits::{NullProgressSink, ProgressSink, StateStore};

// LLM driver re-exports
pub use anthropic::AnthropicDriver;
pub use llm::{LlmCallConfig, LlmDriver, LlmMessage, LlmMessageRole, LlmResponse};
pub use openai::OpenAiDriver;
pub use provider_factory::{resolve_driver, BoxedLlmDriver, ProviderConfig, ProviderType};

// Tool wire types
pub use tool_types::{
    ToolCall, ToolDefinition, GET_SCHEMA_TOOL, RUNNING_QUERY_PROGRESS, RUN_QUERY_TOOL,
};
