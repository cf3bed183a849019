//! Orchestration state types

use crate::conversation::ToolCall;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answer used when the model produced no usable text
pub const FALLBACK_ANSWER: &str = "I apologize, but I couldn't process your request properly.";

/// Prefix of the answer returned when the model cannot be reached
const MODEL_FAILURE_PREFIX: &str = "Error running Ghostwriter agent";

/// Default base delay between model retries; doubles per attempt
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// State of one orchestration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentState {
    /// Waiting on the model for turn `turn`, try number `attempt`
    AwaitingModel { turn: u32, attempt: u32 },

    /// Executing the single honored tool call of `turn`
    DispatchingTool { turn: u32, call: ToolCall },

    /// Run finished, no further events are accepted
    Terminated { outcome: Outcome },
}

impl AgentState {
    pub fn initial() -> Self {
        AgentState::AwaitingModel {
            turn: 1,
            attempt: 1,
        }
    }

    /// Turn number of a live state
    pub fn turn(&self) -> Option<u32> {
        match self {
            AgentState::AwaitingModel { turn, .. } | AgentState::DispatchingTool { turn, .. } => {
                Some(*turn)
            }
            AgentState::Terminated { .. } => None,
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// Model replied without tool calls
    Answered { text: String },
    /// Tool result of the last budgeted turn was recorded
    BudgetExhausted,
    /// Model failed with a non-retryable error or ran out of retries
    ModelFailed { message: String },
    /// Orchestrator hit an impossible transition
    Aborted { reason: String },
}

impl Outcome {
    /// Short label for logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Answered { .. } => "answered",
            Outcome::BudgetExhausted => "budget_exhausted",
            Outcome::ModelFailed { .. } => "model_failed",
            Outcome::Aborted { .. } => "aborted",
        }
    }

    /// Final answer text; `last_text` is the latest non-blank assistant text
    pub fn answer(&self, last_text: Option<&str>) -> String {
        match self {
            Outcome::Answered { text } => text.clone(),
            Outcome::BudgetExhausted => last_text.unwrap_or(FALLBACK_ANSWER).to_string(),
            Outcome::ModelFailed { message } | Outcome::Aborted { reason: message } => {
                format!("{MODEL_FAILURE_PREFIX}: {message}")
            }
        }
    }
}

/// Static parameters of a run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub max_turns: u32,
    pub retry_base_delay: Duration,
}

impl RunContext {
    pub fn new(max_turns: u32) -> Self {
        Self {
            max_turns,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }

    #[must_use]
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (the attempt that failed was `attempt - 1`)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * (1u32 << attempt.saturating_sub(2).min(16))
    }
}
