// Control loop driver
//
// AgentLoop executes the routing state machine against the real seams: the
// LLM driver for model turns and the tool registry for tool turns. One
// conversation thread advances strictly sequentially; the only suspension
// points are the model call and the tool dispatch, and an in-flight call
// always completes before a forced termination takes effect.

use tokio::sync::mpsc;

use crate::config::AgentConfig;
use crate::error::Result;
use crate::events::AgentEvent;
use crate::llm::{LlmCallConfig, LlmDriver, LlmMessage, LlmMessageRole};
use crate::message::Message;
use crate::router::{transition, LoopState, TurnEvent};
use crate::state::AgentState;
use crate::tool_types::{RUNNING_QUERY_PROGRESS, RUN_QUERY_TOOL};
use crate::tools::ToolRegistry;

/// Drives one conversation thread from ModelTurn to Done
pub struct AgentLoop<D>
where
    D: LlmDriver,
{
    driver: D,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl<D> AgentLoop<D>
where
    D: LlmDriver,
{
    pub fn new(driver: D, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self {
            driver,
            tools,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop to completion, mutating the thread's state in place
    pub async fn run(&self, thread_id: &str, state: &mut AgentState) -> Result<()> {
        self.run_with_events(thread_id, state, None).await
    }

    /// Run the loop, optionally emitting one event per transition.
    ///
    /// Event delivery is best-effort: a closed receiver never aborts the
    /// conversation.
    pub async fn run_with_events(
        &self,
        thread_id: &str,
        state: &mut AgentState,
        events: Option<mpsc::Sender<AgentEvent>>,
    ) -> Result<()> {
        let mut current = LoopState::ModelTurn;
        let mut steps_taken = 0u32;

        while !current.is_done() {
            current = match current {
                LoopState::ModelTurn => {
                    state.is_last_step = state.remaining_steps <= 1;

                    let message = self.model_turn(state).await?;
                    let step = transition(
                        state,
                        &current,
                        TurnEvent::ModelResponded(message),
                        self.config.max_query_attempts,
                    )?;

                    let will_continue = !step.next.is_done();
                    for merged in &step.merges {
                        state.messages.merge(merged.clone());
                    }
                    if let (Some(tx), Some(merged)) = (&events, step.merges.last()) {
                        let _ = tx
                            .send(AgentEvent::model_turn_completed(
                                thread_id,
                                merged.clone(),
                                will_continue,
                            ))
                            .await;
                    }

                    // The scheduler consumes one budget unit per model+tool
                    // round trip.
                    state.remaining_steps = state.remaining_steps.saturating_sub(1);
                    steps_taken += 1;

                    step.next
                }

                LoopState::ToolTurn { ref pending } => {
                    let mut results = Vec::with_capacity(pending.len());
                    for call in pending {
                        if call.name == RUN_QUERY_TOOL {
                            // One attempt per dispatch, consumed up front:
                            // the cost is paid whether or not the query
                            // succeeds, and executor-internal retries are a
                            // separate notion entirely.
                            state.query_attempts += 1;
                            state.last_query = call
                                .arguments
                                .get("query")
                                .and_then(|v| v.as_str())
                                .map(String::from);
                            state.progress = Some(RUNNING_QUERY_PROGRESS.to_string());
                            if let Some(tx) = &events {
                                let _ = tx
                                    .send(AgentEvent::progress_updated(
                                        thread_id,
                                        RUNNING_QUERY_PROGRESS,
                                    ))
                                    .await;
                            }
                        }

                        results.push(self.tools.dispatch(call).await?);
                    }

                    let step = transition(
                        state,
                        &current,
                        TurnEvent::ToolsCompleted(results.clone()),
                        self.config.max_query_attempts,
                    )?;
                    for merged in step.merges {
                        state.messages.merge(merged);
                    }
                    if let Some(tx) = &events {
                        let _ = tx
                            .send(AgentEvent::tool_turn_completed(
                                thread_id,
                                results,
                                state.query_attempts,
                            ))
                            .await;
                    }

                    step.next
                }

                LoopState::Done => LoopState::Done,
            };
        }

        tracing::info!(
            thread_id,
            steps = steps_taken,
            query_attempts = state.query_attempts,
            "Conversation reached Done"
        );
        if let Some(tx) = &events {
            let _ = tx
                .send(AgentEvent::done(
                    thread_id,
                    state.final_answer().cloned(),
                    steps_taken,
                ))
                .await;
        }

        Ok(())
    }

    /// One model call: fixed system instruction plus the full transcript,
    /// with the registry's tools bound.
    async fn model_turn(&self, state: &AgentState) -> Result<Message> {
        let mut llm_messages = Vec::with_capacity(state.messages.len() + 1);
        if !self.config.system_prompt.is_empty() {
            llm_messages.push(LlmMessage::text(
                LlmMessageRole::System,
                &self.config.system_prompt,
            ));
        }
        llm_messages.extend(state.messages.iter().map(LlmMessage::from));

        let mut call_config = LlmCallConfig::from(&self.config);
        call_config.tools = self.tools.definitions();

        let response = self.driver.chat_completion(llm_messages, &call_config).await?;
        Ok(response.message)
    }
}
