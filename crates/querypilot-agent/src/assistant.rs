// Assistant: the inbound interface over the control loop
//
// Owns the wiring of driver, tools, config and state store. Each invocation
// loads (or creates) the thread's state, replenishes the step budget, runs
// the loop to completion and persists the result. Query attempts survive
// across invocations of the same thread.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use querypilot_core::{
    resolve_driver, AgentConfig, AgentEvent, AgentLoop, AgentState, BoxedLlmDriver,
    InMemoryStateStore, Message, NullProgressSink, ProgressSink, Result, StateStore, ToolRegistry,
};
use querypilot_db::{QueryBackend, SqlExecutor};

use crate::prompts::SYSTEM_PROMPT;
use crate::settings::Settings;
use crate::tools::{GetSchemaTool, RunQueryTool};

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct AssistantInner {
    agent_loop: AgentLoop<BoxedLlmDriver>,
    store: Arc<dyn StateStore>,
}

/// Conversational SQL assistant over persistent threads
#[derive(Clone)]
pub struct Assistant {
    inner: Arc<AssistantInner>,
}

impl Assistant {
    /// Assemble an assistant from explicit parts
    pub fn new(
        driver: BoxedLlmDriver,
        tools: ToolRegistry,
        config: AgentConfig,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AssistantInner {
                agent_loop: AgentLoop::new(driver, tools, config),
                store,
            }),
        }
    }

    /// Assemble an assistant from environment settings: connects to the
    /// database, resolves the provider driver and binds the two SQL tools.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        Self::from_settings_with_sink(settings, Arc::new(NullProgressSink)).await
    }

    /// Like `from_settings`, with an external progress observer attached
    /// to the query tool.
    pub async fn from_settings_with_sink(
        settings: &Settings,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Self> {
        let backend: Arc<dyn QueryBackend> = Arc::new(
            SqlExecutor::connect(&settings.database_url)
                .await
                .map_err(|err| querypilot_core::AgentError::config(err.to_string()))?,
        );
        let driver = resolve_driver(&settings.provider_config())?;
        let tools = Self::bind_tools_with_sink(backend, progress);
        let config = AgentConfig::new(SYSTEM_PROMPT, settings.model_name.clone());
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        Ok(Self::new(driver, tools, config, store))
    }

    /// Registry with the schema and query tools bound to a backend
    pub fn bind_tools(backend: Arc<dyn QueryBackend>) -> ToolRegistry {
        Self::bind_tools_with_sink(backend, Arc::new(NullProgressSink))
    }

    /// Registry with the query tool's progress routed to `progress`
    pub fn bind_tools_with_sink(
        backend: Arc<dyn QueryBackend>,
        progress: Arc<dyn ProgressSink>,
    ) -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(Arc::new(GetSchemaTool::new(backend.clone())))
            .with_tool(Arc::new(RunQueryTool::new(backend, progress)))
    }

    /// Run one invocation on a thread and return its final state.
    ///
    /// The step budget is replenished per invocation; query attempts are
    /// not, so a thread that already burned its attempts stays terminal.
    pub async fn invoke(&self, thread_id: &str, messages: Vec<Message>) -> Result<AgentState> {
        let mut state = self
            .inner
            .store
            .load(thread_id)
            .await?
            .unwrap_or_else(AgentState::new);
        state.merge_messages(messages);
        state.begin_invocation(self.inner.agent_loop.config().step_budget);

        self.inner.agent_loop.run(thread_id, &mut state).await?;

        self.inner.store.save(thread_id, &state).await?;
        Ok(state)
    }

    /// Run one invocation, streaming loop events as they happen.
    ///
    /// The returned stream ends when the conversation reaches Done or the
    /// invocation fails; failures are logged, not surfaced on the stream.
    pub fn invoke_stream(
        &self,
        thread_id: &str,
        messages: Vec<Message>,
    ) -> ReceiverStream<AgentEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let inner = self.inner.clone();
        let thread_id = thread_id.to_string();

        tokio::spawn(async move {
            let result = async {
                let mut state = inner
                    .store
                    .load(&thread_id)
                    .await?
                    .unwrap_or_else(AgentState::new);
                state.merge_messages(messages);
                state.begin_invocation(inner.agent_loop.config().step_budget);

                inner
                    .agent_loop
                    .run_with_events(&thread_id, &mut state, Some(tx))
                    .await?;

                inner.store.save(&thread_id, &state).await
            }
            .await;

            if let Err(err) = result {
                tracing::error!(thread_id = %thread_id, error = %err, "invocation failed");
            }
        });

        ReceiverStream::new(rx)
    }
}
