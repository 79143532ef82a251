// Core traits for pluggable backends
//
// These traits keep the loop independent of any concrete storage or
// observation transport: in-memory implementations for tests and examples,
// database or channel implementations for production.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::AgentState;

/// Persisted per-thread state, keyed by an opaque thread id
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the state for a thread, if one exists
    async fn load(&self, thread_id: &str) -> Result<Option<AgentState>>;

    /// Save the state for a thread, replacing any previous snapshot
    async fn save(&self, thread_id: &str, state: &AgentState) -> Result<()>;
}

/// Fire-and-forget progress channel for external observers.
///
/// Emission is best-effort: a failed emit must never abort the operation
/// that produced the progress line.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, progress: &str) -> Result<()>;
}

/// A sink that drops everything; useful when no observer is attached
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressSink;

#[async_trait]
impl ProgressSink for NullProgressSink {
    async fn emit(&self, _progress: &str) -> Result<()> {
        Ok(())
    }
}
