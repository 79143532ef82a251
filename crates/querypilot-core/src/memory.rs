// In-memory implementations for examples and testing
//
// These keep all data in memory: good for unit tests, examples, and
// single-process deployments that don't need durable thread storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::state::AgentState;
use crate::traits::{ProgressSink, StateStore};

/// In-memory state store keyed by thread id
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateStore {
    threads: Arc<RwLock<HashMap<String, AgentState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All known thread ids
    pub async fn thread_ids(&self) -> Vec<String> {
        self.threads.read().await.keys().cloned().collect()
    }

    /// Drop a thread's state
    pub async fn clear_thread(&self, thread_id: &str) {
        self.threads.write().await.remove(thread_id);
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, thread_id: &str) -> Result<Option<AgentState>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, state: &AgentState) -> Result<()> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), state.clone());
        Ok(())
    }
}

/// Progress sink that records every emitted line, for assertions in tests
#[derive(Debug, Default, Clone)]
pub struct CollectingProgressSink {
    lines: Arc<RwLock<Vec<String>>>,
}

impl CollectingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lines(&self) -> Vec<String> {
        self.lines.read().await.clone()
    }
}

#[async_trait]
impl ProgressSink for CollectingProgressSink {
    async fn emit(&self, progress: &str) -> Result<()> {
        self.lines.write().await.push(progress.to_string());
        Ok(())
    }
}
