//! Pure state transition function

use super::{AgentState, Effect, Event, Outcome, RunContext, FALLBACK_ANSWER};
use thiserror::Error;

/// Model attempts per turn, first try included
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: AgentState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: AgentState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Run already terminated")]
    AlreadyTerminated,
    #[error("Tool result for {got} does not match pending call {expected}")]
    ForeignToolResult { expected: String, got: String },
    #[error("Retry timer for attempt {got} fired while on attempt {expected}")]
    StaleRetry { expected: u32, got: u32 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// expressed as returned effects.
pub fn transition(
    state: &AgentState,
    context: &RunContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (AgentState::Terminated { .. }, _) => Err(TransitionError::AlreadyTerminated),

        // No tool calls: the text is the answer
        (AgentState::AwaitingModel { .. }, Event::ModelResponse { text, tool_calls })
            if tool_calls.is_empty() =>
        {
            let answer = if text.trim().is_empty() {
                FALLBACK_ANSWER.to_string()
            } else {
                text.clone()
            };
            Ok(TransitionResult::new(AgentState::Terminated {
                outcome: Outcome::Answered { text: answer },
            })
            .with_effect(Effect::RecordAssistant {
                text,
                tool_call: None,
            }))
        }

        // Only the first call is honored; the rest are left for the model to re-request
        (AgentState::AwaitingModel { turn, .. }, Event::ModelResponse { text, tool_calls }) => {
            let mut calls = tool_calls.into_iter();
            let Some(call) = calls.next() else {
                return Err(TransitionError::InvalidTransition(
                    "tool call list emptied during transition".to_string(),
                ));
            };
            let deferred: Vec<String> = calls.map(|c| c.name).collect();

            let mut result = TransitionResult::new(AgentState::DispatchingTool {
                turn: *turn,
                call: call.clone(),
            })
            .with_effect(Effect::RecordAssistant {
                text,
                tool_call: Some(call.clone()),
            });
            if !deferred.is_empty() {
                result = result.with_effect(Effect::DeferCalls { names: deferred });
            }
            Ok(result.with_effect(Effect::DispatchTool { call }))
        }

        (
            AgentState::AwaitingModel { turn, attempt },
            Event::ModelError {
                message,
                kind,
                retry_after,
            },
        ) => {
            if kind.is_retryable() && *attempt < MAX_ATTEMPTS {
                let next = attempt + 1;
                let backoff = context.retry_delay(next);
                Ok(TransitionResult::new(AgentState::AwaitingModel {
                    turn: *turn,
                    attempt: next,
                })
                .with_effect(Effect::ScheduleRetry {
                    delay: retry_after.map_or(backoff, |asked| asked.max(backoff)),
                    attempt: next,
                }))
            } else {
                Ok(TransitionResult::new(AgentState::Terminated {
                    outcome: Outcome::ModelFailed { message },
                }))
            }
        }

        (AgentState::AwaitingModel { attempt, .. }, Event::RetryTimeout { attempt: fired }) => {
            if fired == *attempt {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::RequestModel))
            } else {
                Err(TransitionError::StaleRetry {
                    expected: *attempt,
                    got: fired,
                })
            }
        }

        (
            AgentState::DispatchingTool { turn, call },
            Event::ToolComplete {
                tool_use_id,
                content,
                is_error,
            },
        ) => {
            if tool_use_id != call.id {
                return Err(TransitionError::ForeignToolResult {
                    expected: call.id.clone(),
                    got: tool_use_id,
                });
            }

            let record = Effect::RecordToolResult {
                tool_use_id,
                name: call.name.clone(),
                content,
                is_error,
            };

            if *turn >= context.max_turns {
                return Ok(TransitionResult::new(AgentState::Terminated {
                    outcome: Outcome::BudgetExhausted,
                })
                .with_effect(record));
            }

            Ok(TransitionResult::new(AgentState::AwaitingModel {
                turn: turn + 1,
                attempt: 1,
            })
            .with_effect(record)
            .with_effect(Effect::RequestModel))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}
