//! Orchestration runtime executor

use super::traits::{LlmClient, ToolExecutor};
use crate::conversation::{Conversation, Message, ToolCall};
use crate::llm::LlmRequest;
use crate::state_machine::{transition, AgentState, Effect, Event, Outcome, RunContext};
use crate::system_prompt::build_system_prompt;
use crate::tools::normalize;
use crate::tools::{ArgumentMemory, ToolError};
use serde_json::Value;
use std::time::{Duration, Instant};

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RESPONSE_TOKENS: u32 = 4096;

/// Result of one orchestration run
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub answer: String,
    pub outcome: Outcome,
    /// Model responses consumed, retries excluded
    pub model_turns: u32,
    /// Full transcript, reusable for a follow-up run
    pub conversation: Conversation,
}

/// Per-run mutable data owned by the executor
struct RunState {
    state: AgentState,
    conversation: Conversation,
    memory: ArgumentMemory,
    model_turns: u32,
}

/// Generic orchestration runtime that can work with any LLM and tool implementations
pub struct AgentRuntime<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    llm: L,
    tools: T,
    context: RunContext,
    system_prompt: String,
    tool_timeout: Duration,
}

impl<L, T> AgentRuntime<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub fn new(llm: L, tools: T, context: RunContext) -> Self {
        Self {
            llm,
            tools,
            context,
            system_prompt: build_system_prompt(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Start a fresh conversation
    pub async fn run(&self, prompt: &str) -> AgentReply {
        self.run_with_history(Conversation::new(), prompt).await
    }

    /// Continue `history` with a new caller message
    pub async fn run_with_history(&self, history: Conversation, prompt: &str) -> AgentReply {
        let memory = ArgumentMemory::replay(history.tool_results());
        let mut run = RunState {
            state: AgentState::initial(),
            conversation: history,
            memory,
            model_turns: 0,
        };
        run.conversation.push(Message::User {
            text: prompt.to_string(),
        });

        tracing::info!(
            model = %self.llm.model_id(),
            max_turns = self.context.max_turns,
            history = run.conversation.len() - 1,
            "Starting agent run"
        );

        // Process events in a loop - no recursion
        let first = self.query_model(&mut run).await;
        let mut events_to_process = vec![first];

        while let Some(event) = events_to_process.pop() {
            let result = match transition(&run.state, &self.context, event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(error = %e, state = ?run.state, "Invalid transition, aborting run");
                    run.state = AgentState::Terminated {
                        outcome: Outcome::Aborted {
                            reason: e.to_string(),
                        },
                    };
                    break;
                }
            };

            run.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, &mut run).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        let outcome = match run.state {
            AgentState::Terminated { outcome } => outcome,
            other => Outcome::Aborted {
                reason: format!("run stopped without terminating in {other:?}"),
            },
        };
        let answer = outcome.answer(run.conversation.last_assistant_text());

        tracing::info!(
            stop_reason = outcome.label(),
            model_turns = run.model_turns,
            messages = run.conversation.len(),
            "Agent run finished"
        );

        AgentReply {
            answer,
            outcome,
            model_turns: run.model_turns,
            conversation: run.conversation,
        }
    }

    async fn execute_effect(&self, effect: Effect, run: &mut RunState) -> Option<Event> {
        match effect {
            Effect::RecordAssistant { text, tool_call } => {
                run.conversation.push(Message::Assistant { text, tool_call });
                None
            }

            Effect::DeferCalls { names } => {
                tracing::warn!(
                    turn = run.state.turn(),
                    deferred = ?names,
                    "Model requested several tools; only the first runs this turn"
                );
                None
            }

            Effect::DispatchTool { call } => Some(self.dispatch_tool(call, &mut run.memory).await),

            Effect::RecordToolResult {
                tool_use_id,
                name,
                content,
                is_error,
            } => {
                run.conversation.push(Message::ToolResult {
                    tool_use_id,
                    name,
                    content,
                    is_error,
                });
                None
            }

            Effect::RequestModel => Some(self.query_model(run).await),

            Effect::ScheduleRetry { delay, attempt } => {
                tracing::warn!(
                    turn = run.state.turn(),
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying model request"
                );
                tokio::time::sleep(delay).await;
                Some(Event::RetryTimeout { attempt })
            }
        }
    }

    async fn query_model(&self, run: &mut RunState) -> Event {
        let request = LlmRequest {
            system: self.system_prompt.clone(),
            messages: run.conversation.to_llm_messages(),
            tools: self.tools.definitions(),
            max_tokens: Some(MAX_RESPONSE_TOKENS),
        };

        match self.llm.complete(&request).await {
            Ok(response) => {
                run.model_turns += 1;
                let tool_calls = response
                    .tool_uses()
                    .into_iter()
                    .map(|(id, name, input)| ToolCall::new(id, name, input.clone()))
                    .collect();
                Event::ModelResponse {
                    text: response.text(),
                    tool_calls,
                }
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind, error = %e, "Model request failed");
                Event::ModelError {
                    message: e.message,
                    kind: e.kind,
                    retry_after: e.retry_after,
                }
            }
        }
    }

    /// Normalize, execute under the deadline, and fold failures into a payload
    async fn dispatch_tool(&self, call: ToolCall, memory: &mut ArgumentMemory) -> Event {
        let started = Instant::now();
        let normalized = self
            .tools
            .argument_rule(&call.name)
            .and_then(|rule| normalize::normalize(&call.name, rule, call.input.clone(), memory));

        let (args, result) = match normalized {
            Ok(args) => {
                let result = self.execute_with_deadline(&call.name, args.clone()).await;
                (args, result)
            }
            Err(e) => (call.input.clone(), Err(e)),
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (content, is_error) = match result {
            Ok(content) => {
                tracing::info!(tool = %call.name, duration_ms, "Tool completed");
                memory.observe(&content);
                (content, false)
            }
            Err(e) => {
                tracing::warn!(
                    tool = %call.name,
                    kind = e.kind(),
                    duration_ms,
                    error = %e,
                    "Tool failed"
                );
                (e.to_payload(&args), true)
            }
        };

        Event::ToolComplete {
            tool_use_id: call.id,
            content,
            is_error,
        }
    }

    async fn execute_with_deadline(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        tokio::time::timeout(self.tool_timeout, self.tools.execute(name, args))
            .await
            .unwrap_or_else(|_| {
                Err(ToolError::Timeout {
                    tool: name.to_string(),
                    after: self.tool_timeout,
                })
            })
    }
}
