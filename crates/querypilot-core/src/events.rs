// Per-step events for incremental invocation
//
// One event is produced per control-loop transition; the stream ends when
// the loop reaches Done. Progress updates from the tool layer are forwarded
// on the same stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A state delta emitted after a control-loop transition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A model turn completed; the assistant message was merged
    ModelTurnCompleted {
        thread_id: String,
        message: Message,
        will_continue: bool,
        timestamp: DateTime<Utc>,
    },

    /// A tool turn completed; one result message per dispatched call
    ToolTurnCompleted {
        thread_id: String,
        results: Vec<Message>,
        query_attempts: u32,
        timestamp: DateTime<Utc>,
    },

    /// Progress line overwritten on the state (fire-and-forget channel)
    ProgressUpdated {
        thread_id: String,
        progress: String,
        timestamp: DateTime<Utc>,
    },

    /// The loop reached its terminal state
    Done {
        thread_id: String,
        final_message: Option<Message>,
        total_steps: u32,
        timestamp: DateTime<Utc>,
    },
}

impl AgentEvent {
    pub fn model_turn_completed(
        thread_id: impl Into<String>,
        message: Message,
        will_continue: bool,
    ) -> Self {
        AgentEvent::ModelTurnCompleted {
            thread_id: thread_id.into(),
            message,
            will_continue,
            timestamp: Utc::now(),
        }
    }

    pub fn tool_turn_completed(
        thread_id: impl Into<String>,
        results: Vec<Message>,
        query_attempts: u32,
    ) -> Self {
        AgentEvent::ToolTurnCompleted {
            thread_id: thread_id.into(),
            results,
            query_attempts,
            timestamp: Utc::now(),
        }
    }

    pub fn progress_updated(thread_id: impl Into<String>, progress: impl Into<String>) -> Self {
        AgentEvent::ProgressUpdated {
            thread_id: thread_id.into(),
            progress: progress.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn done(
        thread_id: impl Into<String>,
        final_message: Option<Message>,
        total_steps: u32,
    ) -> Self {
        AgentEvent::Done {
            thread_id: thread_id.into(),
            final_message,
            total_steps,
            timestamp: Utc::now(),
        }
    }

    /// The thread this event belongs to
    pub fn thread_id(&self) -> &str {
        match self {
            AgentEvent::ModelTurnCompleted { thread_id, .. } => thread_id,
            AgentEvent::ToolTurnCompleted { thread_id, .. } => thread_id,
            AgentEvent::ProgressUpdated { thread_id, .. } => thread_id,
            AgentEvent::Done { thread_id, .. } => thread_id,
        }
    }
}
