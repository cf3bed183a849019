//! Conversation transcript for one orchestration run
//!
//! Append-only. Every honored tool call is followed by exactly one
//! [`Message::ToolResult`] carrying the same id.

use crate::llm::{ContentBlock, LlmMessage, MessageRole};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call: Option<ToolCall>,
    },
    ToolResult {
        tool_use_id: String,
        name: String,
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent assistant text that is not blank
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { text, .. } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    /// Contents of successful tool results, oldest first
    pub fn tool_results(&self) -> impl Iterator<Item = &Value> {
        self.messages.iter().filter_map(|m| match m {
            Message::ToolResult {
                content,
                is_error: false,
                ..
            } => Some(content),
            _ => None,
        })
    }

    /// Convert the transcript to provider-neutral LLM messages
    pub fn to_llm_messages(&self) -> Vec<LlmMessage> {
        self.messages
            .iter()
            .map(|message| match message {
                Message::User { text } => LlmMessage {
                    role: MessageRole::User,
                    content: vec![ContentBlock::text(text.clone())],
                },
                Message::Assistant { text, tool_call } => {
                    let mut content = Vec::new();
                    if !text.is_empty() {
                        content.push(ContentBlock::text(text.clone()));
                    }
                    if let Some(call) = tool_call {
                        content.push(ContentBlock::tool_use(
                            call.id.clone(),
                            call.name.clone(),
                            call.input.clone(),
                        ));
                    }
                    LlmMessage {
                        role: MessageRole::Assistant,
                        content,
                    }
                }
                Message::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                    ..
                } => LlmMessage {
                    role: MessageRole::User,
                    content: vec![ContentBlock::tool_result(
                        tool_use_id.clone(),
                        content.to_string(),
                        *is_error,
                    )],
                },
            })
            .collect()
    }
}
