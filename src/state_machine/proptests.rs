//! Property-based tests for the state machine
//!
//! Drives `transition` with arbitrary model behaviour the way the runtime
//! would, and checks the run-level guarantees.

use super::*;
use crate::conversation::ToolCall;
use crate::llm::LlmErrorKind;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;

// ============================================================================
// Generators
// ============================================================================

/// One scripted model reply
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Calls(Vec<String>),
    Error(LlmErrorKind),
}

fn arb_error_kind() -> impl Strategy<Value = LlmErrorKind> {
    prop_oneof![
        Just(LlmErrorKind::Network),
        Just(LlmErrorKind::RateLimit),
        Just(LlmErrorKind::ServerError),
        Just(LlmErrorKind::Auth),
        Just(LlmErrorKind::ModelNotFound),
        Just(LlmErrorKind::InvalidRequest),
        Just(LlmErrorKind::Unknown),
    ]
}

fn arb_tool_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("search_ghostwriter_clients".to_string()),
        Just("generate_ghostwriter_codename".to_string()),
        Just("create_ghostwriter_project".to_string()),
        Just("explain_workflow".to_string()),
    ]
}

fn arb_reply() -> impl Strategy<Value = Reply> {
    prop_oneof![
        1 => "[a-zA-Z ]{0,20}".prop_map(Reply::Text),
        6 => proptest::collection::vec(arb_tool_name(), 1..4).prop_map(Reply::Calls),
        2 => arb_error_kind().prop_map(Reply::Error),
    ]
}

// ============================================================================
// Simulated runtime
// ============================================================================

#[derive(Debug, Default)]
struct Trace {
    /// Model responses consumed (successful queries)
    answered_turns: u32,
    dispatched: Vec<String>,
    recorded_results: Vec<String>,
    recorded_calls: Vec<String>,
    outcome: Option<Outcome>,
    steps: usize,
}

/// Run the machine against scripted replies. Once the script is exhausted the
/// model keeps asking for a tool.
fn simulate(max_turns: u32, script: &[Reply], tool_fails: bool) -> Trace {
    let ctx = RunContext::new(max_turns).with_retry_base_delay(Duration::ZERO);
    let mut state = AgentState::initial();
    let mut trace = Trace::default();
    let mut replies = script.iter().cloned();
    let mut next_id = 0u32;

    // Pending events, processed LIFO like the runtime
    let mut pending = vec![model_event(replies.next(), &mut next_id)];

    while let Some(event) = pending.pop() {
        trace.steps += 1;
        assert!(trace.steps < 10_000, "runaway simulation");

        if matches!(event, Event::ModelResponse { .. }) {
            trace.answered_turns += 1;
        }

        let result = transition(&state, &ctx, event).expect("runtime-shaped events are valid");
        state = result.new_state;

        for effect in result.effects {
            match effect {
                Effect::RecordAssistant { tool_call, .. } => {
                    if let Some(call) = tool_call {
                        trace.recorded_calls.push(call.id);
                    }
                }
                Effect::DispatchTool { call } => {
                    trace.dispatched.push(call.id.clone());
                    pending.push(Event::ToolComplete {
                        tool_use_id: call.id,
                        content: if tool_fails {
                            json!({"error": "boom", "kind": "backend", "args": {}})
                        } else {
                            json!({"ok": true})
                        },
                        is_error: tool_fails,
                    });
                }
                Effect::RecordToolResult { tool_use_id, .. } => {
                    trace.recorded_results.push(tool_use_id);
                }
                Effect::RequestModel => {
                    pending.push(model_event(replies.next(), &mut next_id));
                }
                Effect::ScheduleRetry { attempt, .. } => {
                    pending.push(Event::RetryTimeout { attempt });
                }
                Effect::DeferCalls { .. } => {}
            }
        }
    }

    if let AgentState::Terminated { outcome } = state {
        trace.outcome = Some(outcome);
    }
    trace
}

fn model_event(reply: Option<Reply>, next_id: &mut u32) -> Event {
    let reply = reply.unwrap_or_else(|| Reply::Calls(vec!["explain_workflow".to_string()]));
    match reply {
        Reply::Text(text) => Event::ModelResponse {
            text,
            tool_calls: vec![],
        },
        Reply::Calls(names) => Event::ModelResponse {
            text: String::new(),
            tool_calls: names
                .into_iter()
                .map(|name| {
                    *next_id += 1;
                    ToolCall::new(format!("call_{next_id}"), name, json!({}))
                })
                .collect(),
        },
        Reply::Error(kind) => Event::ModelError {
            message: format!("{kind:?}"),
            kind,
            retry_after: None,
        },
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_budget_bounds_model_queries(
        max_turns in 1u32..8,
        script in proptest::collection::vec(arb_reply(), 0..20),
        tool_fails in any::<bool>(),
    ) {
        let trace = simulate(max_turns, &script, tool_fails);
        prop_assert!(trace.answered_turns <= max_turns);
        prop_assert!(u32::try_from(trace.dispatched.len()).unwrap() <= max_turns);
    }

    #[test]
    fn prop_every_dispatch_gets_exactly_one_result(
        max_turns in 1u32..8,
        script in proptest::collection::vec(arb_reply(), 0..20),
        tool_fails in any::<bool>(),
    ) {
        let trace = simulate(max_turns, &script, tool_fails);
        prop_assert_eq!(&trace.dispatched, &trace.recorded_results);
        prop_assert_eq!(&trace.dispatched, &trace.recorded_calls);
        let unique: HashSet<_> = trace.dispatched.iter().collect();
        prop_assert_eq!(unique.len(), trace.dispatched.len());
    }

    #[test]
    fn prop_run_always_terminates(
        max_turns in 1u32..8,
        script in proptest::collection::vec(arb_reply(), 0..20),
    ) {
        let trace = simulate(max_turns, &script, false);
        prop_assert!(trace.outcome.is_some());
    }

    #[test]
    fn prop_tool_failures_never_end_the_run_early(
        max_turns in 1u32..6,
    ) {
        // Model always calls a tool and every tool fails
        let trace = simulate(max_turns, &[], true);
        prop_assert_eq!(trace.outcome, Some(Outcome::BudgetExhausted));
        prop_assert_eq!(trace.answered_turns, max_turns);
    }

    #[test]
    fn prop_retries_stay_within_turn(
        errors in 0u32..MAX_ATTEMPTS,
        kind in prop_oneof![
            Just(LlmErrorKind::Network),
            Just(LlmErrorKind::RateLimit),
            Just(LlmErrorKind::ServerError),
        ],
    ) {
        let mut script: Vec<Reply> = (0..errors).map(|_| Reply::Error(kind)).collect();
        script.push(Reply::Text("done".to_string()));
        let trace = simulate(1, &script, false);
        prop_assert_eq!(
            trace.outcome,
            Some(Outcome::Answered { text: "done".to_string() })
        );
    }

    #[test]
    fn prop_terminated_state_absorbs(
        text in "[a-z]{0,10}",
    ) {
        let state = AgentState::Terminated { outcome: Outcome::BudgetExhausted };
        let result = transition(
            &state,
            &RunContext::new(3),
            Event::ModelResponse { text, tool_calls: vec![] },
        );
        prop_assert_eq!(result.unwrap_err(), TransitionError::AlreadyTerminated);
    }
}
