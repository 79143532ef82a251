// Agent state - the mutable conversation record
//
// AgentState is threaded through every control-loop step. It is owned
// exclusively by one conversation thread; the loop and the tool dispatch are
// its only mutators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, Transcript};

/// Default step budget per invocation
pub const DEFAULT_STEP_BUDGET: u32 = 25;

/// Hard cap on run_query dispatches per thread
pub const MAX_QUERY_ATTEMPTS: u32 = 3;

/// The conversation record for one thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// The conversation transcript; grows monotonically except for
    /// identity-based replacement
    pub messages: Transcript,

    /// Step budget, decremented once per control-loop iteration
    pub remaining_steps: u32,

    /// True exactly when the current iteration is the final one the step
    /// budget allows
    pub is_last_step: bool,

    /// Count of run_query tool dispatches, success or failure alike.
    /// Survives thread resumption: the attempt budget belongs to the stored
    /// thread, not to a single invocation.
    pub query_attempts: u32,

    /// Last SQL statement handed to the query tool
    pub last_query: Option<String>,

    /// Human-readable progress line for observers; overwritten, never
    /// appended
    pub progress: Option<String>,
}

impl AgentState {
    /// Create a fresh state with the default step budget
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_STEP_BUDGET)
    }

    /// Create a fresh state with a specific step budget
    pub fn with_budget(steps: u32) -> Self {
        Self {
            messages: Transcript::new(),
            remaining_steps: steps,
            is_last_step: false,
            query_attempts: 0,
            last_query: None,
            progress: None,
        }
    }

    /// Replenish the step budget for a new invocation.
    ///
    /// `query_attempts` is deliberately left untouched: the attempt budget
    /// is a property of the thread, not of the call.
    pub fn begin_invocation(&mut self, steps: u32) {
        self.remaining_steps = steps;
        self.is_last_step = false;
        self.progress = None;
    }

    /// Append inbound messages to the transcript (merged by identity)
    pub fn merge_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.merge_all(messages);
    }

    /// Explicit serialization contract for external consumers.
    ///
    /// Returns ordered field name / value pairs; the field order is part of
    /// the contract. Consumers must use this instead of probing attributes.
    pub fn snapshot(&self) -> Vec<(&'static str, Value)> {
        vec![
            (
                "messages",
                serde_json::to_value(self.messages.messages()).unwrap_or(Value::Null),
            ),
            ("remaining_steps", Value::from(self.remaining_steps)),
            ("is_last_step", Value::from(self.is_last_step)),
            ("query_attempts", Value::from(self.query_attempts)),
            (
                "last_query",
                self.last_query
                    .as_deref()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            ),
            (
                "progress",
                self.progress
                    .as_deref()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            ),
        ]
    }

    /// The final assistant answer, if the conversation has produced one
    pub fn final_answer(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::message::MessageRole::Assistant && !m.has_tool_calls())
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new()
    }
}
