// Agent configuration for the loop

use serde::{Deserialize, Serialize};

use crate::state::{DEFAULT_STEP_BUDGET, MAX_QUERY_ATTEMPTS};
use crate::tool_types::ToolDefinition;

/// Configuration for the control loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System prompt that defines the agent's behavior; injected once per
    /// model call, never persisted in the transcript
    pub system_prompt: String,

    /// Model identifier (e.g. "gpt-4o", "claude-sonnet-4-20250514")
    pub model: String,

    /// Tools advertised to the model
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    /// Step budget per invocation (model/tool round trips)
    #[serde(default = "default_step_budget")]
    pub step_budget: u32,

    /// Hard cap on run_query dispatches per thread
    #[serde(default = "default_max_query_attempts")]
    pub max_query_attempts: u32,

    /// Temperature for LLM sampling
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate per response
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_step_budget() -> u32 {
    DEFAULT_STEP_BUDGET
}

fn default_max_query_attempts() -> u32 {
    MAX_QUERY_ATTEMPTS
}

impl AgentConfig {
    /// Create a new configuration
    pub fn new(system_prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            model: model.into(),
            tools: Vec::new(),
            step_budget: DEFAULT_STEP_BUDGET,
            max_query_attempts: MAX_QUERY_ATTEMPTS,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the advertised tools
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the step budget
    pub fn with_step_budget(mut self, steps: u32) -> Self {
        self.step_budget = steps;
        self
    }

    /// Set the query attempt cap
    pub fn with_max_query_attempts(mut self, attempts: u32) -> Self {
        self.max_query_attempts = attempts;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token cap per response
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}
