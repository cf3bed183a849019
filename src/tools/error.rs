//! Tool error types

use crate::backend::BackendError;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single tool dispatch.
///
/// None of these end an orchestration run: they are rendered into the
/// conversation as an error payload and the model decides what to do next.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool}: {reason}")]
    Validation { tool: String, reason: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Failed to call {tool}: {source}")]
    Backend {
        tool: String,
        #[source]
        source: BackendError,
    },

    #[error("{tool} timed out after {}s", after.as_secs())]
    Timeout { tool: String, after: Duration },

    /// The tool failed to render its own result
    #[error("{tool} could not build its result: {reason}")]
    Internal { tool: String, reason: String },
}

impl ToolError {
    pub fn validation(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(tool: impl Into<String>, source: BackendError) -> Self {
        Self::Backend {
            tool: tool.into(),
            source,
        }
    }

    /// Stable machine-readable classification
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::UnknownTool(_) => "unknown_tool",
            Self::DuplicateTool(_) => "duplicate_tool",
            Self::Backend { .. } => "backend",
            Self::Timeout { .. } => "timeout",
            Self::Internal { .. } => "internal",
        }
    }

    /// Payload recorded in the conversation for a failed call
    pub fn to_payload(&self, args: &Value) -> Value {
        json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "args": args,
        })
    }
}
