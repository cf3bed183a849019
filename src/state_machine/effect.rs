//! Effects produced by state transitions

use crate::conversation::ToolCall;
use serde_json::Value;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append an assistant message with its honored call, if any
    RecordAssistant {
        text: String,
        tool_call: Option<ToolCall>,
    },

    /// Log tool calls that were not honored this turn
    DeferCalls { names: Vec<String> },

    /// Normalize arguments and run a tool
    DispatchTool { call: ToolCall },

    /// Append a tool result message
    RecordToolResult {
        tool_use_id: String,
        name: String,
        content: Value,
        is_error: bool,
    },

    /// Query the model with the current conversation
    RequestModel,

    /// Wait, then fire `RetryTimeout`
    ScheduleRetry { delay: Duration, attempt: u32 },
}
