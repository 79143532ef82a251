// Routing state machine for the control loop
//
// The loop cycles between a model turn and a tool turn until a termination
// condition fires. The cycle is expressed as an explicit enumerated state
// plus a pure transition function over (state, event); the function never
// performs IO, so the whole routing policy is testable without a model or a
// database. The AgentLoop driver owns the IO and applies the returned
// merges to the transcript.

use anyhow::anyhow;

use crate::error::{AgentError, Result};
use crate::message::{Message, MessageRole};
use crate::state::AgentState;
use crate::tool_types::ToolCall;

/// Fixed answer substituted when the step budget runs out while the model
/// still wants a tool
pub const FALLBACK_ANSWER: &str =
    "Sorry, I could not find an answer to your question in the specified number of steps.";

/// Control-loop states
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// Awaiting the model's next assistant message
    ModelTurn,
    /// Executing the requested tool calls, in request order
    ToolTurn { pending: Vec<ToolCall> },
    /// Terminal; the conversation remains resumable by a later invocation
    Done,
}

impl LoopState {
    pub fn is_done(&self) -> bool {
        matches!(self, LoopState::Done)
    }
}

/// Events fed into the transition function by the driver
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// The model produced exactly one message
    ModelResponded(Message),
    /// All pending tool calls were dispatched; one result message each
    ToolsCompleted(Vec<Message>),
}

/// Outcome of a single transition: the next state plus the messages the
/// driver must merge into the transcript (in order, by identity).
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: LoopState,
    pub merges: Vec<Message>,
}

impl Transition {
    fn to(next: LoopState, merges: Vec<Message>) -> Self {
        Self { next, merges }
    }
}

/// Pure routing decision for one control-loop step.
///
/// Routing policy after a model turn:
/// 1. a non-assistant message is a fatal protocol violation;
/// 2. on the last budgeted step a pending tool request is overridden by the
///    fixed fallback answer, reusing the raw response's message id;
/// 3. no tool call terminates with the message as the final answer;
/// 4. an exhausted query-attempt budget terminates, abandoning the pending
///    tool request without executing it;
/// 5. otherwise the requested calls are handed to the tool turn.
pub fn transition(
    state: &AgentState,
    current: &LoopState,
    event: TurnEvent,
    max_query_attempts: u32,
) -> Result<Transition> {
    match (current, event) {
        (LoopState::ModelTurn, TurnEvent::ModelResponded(message)) => {
            if message.role != MessageRole::Assistant {
                return Err(AgentError::UnexpectedMessageKind(message.role.to_string()));
            }

            if state.is_last_step && message.has_tool_calls() {
                // Keep the original message id so consumers matching by
                // identity see a replacement, not a new message.
                let mut fallback = Message::assistant(FALLBACK_ANSWER);
                fallback.id = message.id;
                return Ok(Transition::to(LoopState::Done, vec![fallback]));
            }

            let pending = message.tool_calls.clone().unwrap_or_default();

            if pending.is_empty() {
                return Ok(Transition::to(LoopState::Done, vec![message]));
            }

            if state.query_attempts >= max_query_attempts {
                // Hard cap: the pending tool request is abandoned unexecuted.
                tracing::info!(
                    query_attempts = state.query_attempts,
                    "Query attempt budget exhausted, terminating"
                );
                return Ok(Transition::to(LoopState::Done, vec![message]));
            }

            Ok(Transition::to(
                LoopState::ToolTurn { pending },
                vec![message],
            ))
        }

        (LoopState::ToolTurn { .. }, TurnEvent::ToolsCompleted(results)) => {
            Ok(Transition::to(LoopState::ModelTurn, results))
        }

        (current, event) => Err(AgentError::Internal(anyhow!(
            "invalid transition: {current:?} on {event:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MAX_QUERY_ATTEMPTS;
    use serde_json::json;

    fn query_call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "run_query".to_string(),
            arguments: json!({"query": "SELECT 1"}),
        }
    }

    #[test]
    fn test_final_answer_terminates() {
        let state = AgentState::new();
        let answer = Message::assistant("The total revenue is 61312.04.");

        let t = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ModelResponded(answer.clone()),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap();

        assert!(t.next.is_done());
        assert_eq!(t.merges.len(), 1);
        assert_eq!(t.merges[0].id, answer.id);
    }

    #[test]
    fn test_tool_request_enters_tool_turn() {
        let state = AgentState::new();
        let request = Message::assistant_with_tools("", vec![query_call("call_1")]);

        let t = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ModelResponded(request),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap();

        match t.next {
            LoopState::ToolTurn { pending } => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].id, "call_1");
            }
            other => panic!("expected ToolTurn, got {other:?}"),
        }
    }

    #[test]
    fn test_exhausted_attempts_force_done() {
        let mut state = AgentState::new();
        state.query_attempts = MAX_QUERY_ATTEMPTS;
        let request = Message::assistant_with_tools("", vec![query_call("call_4")]);

        let t = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ModelResponded(request.clone()),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap();

        // Terminates even though a tool call is pending; the assistant
        // message is still recorded, the call is never executed.
        assert!(t.next.is_done());
        assert_eq!(t.merges[0].id, request.id);
    }

    #[test]
    fn test_last_step_substitutes_fallback_with_same_id() {
        let mut state = AgentState::new();
        state.is_last_step = true;
        let request = Message::assistant_with_tools("", vec![query_call("call_1")]);
        let original_id = request.id;

        let t = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ModelResponded(request),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap();

        assert!(t.next.is_done());
        assert_eq!(t.merges.len(), 1);
        assert_eq!(t.merges[0].id, original_id);
        assert_eq!(t.merges[0].content, FALLBACK_ANSWER);
        assert!(!t.merges[0].has_tool_calls());
    }

    #[test]
    fn test_last_step_without_tools_is_a_normal_answer() {
        let mut state = AgentState::new();
        state.is_last_step = true;
        let answer = Message::assistant("Done in time.");

        let t = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ModelResponded(answer),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap();

        assert!(t.next.is_done());
        assert_eq!(t.merges[0].content, "Done in time.");
    }

    #[test]
    fn test_non_assistant_message_is_fatal() {
        let state = AgentState::new();
        let bogus = Message::user("I am not an assistant");

        let err = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ModelResponded(bogus),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap_err();

        assert!(matches!(err, AgentError::UnexpectedMessageKind(kind) if kind == "user"));
    }

    #[test]
    fn test_tools_completed_returns_to_model_turn() {
        let state = AgentState::new();
        let results = vec![Message::tool_result("call_1", "run_query", "[]")];

        let t = transition(
            &state,
            &LoopState::ToolTurn {
                pending: vec![query_call("call_1")],
            },
            TurnEvent::ToolsCompleted(results),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap();

        assert_eq!(t.next, LoopState::ModelTurn);
        assert_eq!(t.merges.len(), 1);
    }

    #[test]
    fn test_mismatched_event_is_internal_error() {
        let state = AgentState::new();
        let err = transition(
            &state,
            &LoopState::ModelTurn,
            TurnEvent::ToolsCompleted(vec![]),
            MAX_QUERY_ATTEMPTS,
        )
        .unwrap_err();

        assert!(matches!(err, AgentError::Internal(_)));
    }
}
