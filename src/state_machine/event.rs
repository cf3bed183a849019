//! Events that drive the orchestrator

use crate::conversation::ToolCall;
use crate::llm::LlmErrorKind;
use serde_json::Value;
use std::time::Duration;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Model answered, possibly with tool calls
    ModelResponse {
        text: String,
        tool_calls: Vec<ToolCall>,
    },
    ModelError {
        message: String,
        kind: LlmErrorKind,
        /// Minimum pause the endpoint asked for before the next attempt
        retry_after: Option<Duration>,
    },
    RetryTimeout {
        attempt: u32,
    },
    /// Tool finished; `content` is the result or the structured error payload
    ToolComplete {
        tool_use_id: String,
        content: Value,
        is_error: bool,
    },
}
