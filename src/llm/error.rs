//! Model endpoint failures
//!
//! The agent binds one OpenAI-compatible endpoint, usually a local Ollama.
//! [`LlmError::from_status`] turns a failed HTTP exchange into a classified
//! error; the orchestrator only ever asks whether the kind is retryable.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Longest server-requested pause honored before a retry
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    /// Pause requested by the endpoint through `Retry-After`
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay.min(MAX_RETRY_AFTER));
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Classify a non-success response from the chat completions endpoint.
    ///
    /// `body` is searched for the `{"error": {"message": ...}}` envelope that
    /// both OpenAI and Ollama return; anything else is reported verbatim.
    pub fn from_status(status: u16, body: &str, model: &str) -> Self {
        let detail = error_message(body);
        match status {
            401 | 403 => Self::new(
                LlmErrorKind::Auth,
                format!("Model endpoint rejected the credentials (check LLM_API_KEY): {detail}"),
            ),
            404 if mentions_model(&detail) => Self::new(
                LlmErrorKind::ModelNotFound,
                format!("Model '{model}' is not available on the endpoint (pull it or set LLM_MODEL): {detail}"),
            ),
            404 => Self::new(
                LlmErrorKind::InvalidRequest,
                format!("Endpoint not found (check LLM_BASE_URL): {detail}"),
            ),
            400 | 422 => Self::new(LlmErrorKind::InvalidRequest, format!("Invalid request: {detail}")),
            408 => Self::new(LlmErrorKind::Network, format!("Model endpoint timed out: {detail}")),
            429 => Self::new(LlmErrorKind::RateLimit, format!("Rate limit exceeded: {detail}")),
            500..=599 => Self::new(LlmErrorKind::ServerError, format!("Server error {status}: {detail}")),
            _ => Self::new(LlmErrorKind::Unknown, format!("HTTP {status}: {detail}")),
        }
    }
}

/// Parse a `Retry-After` header value. Only the delay-seconds form is used;
/// HTTP dates are ignored and the normal backoff applies.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object { message: String },
    // Older Ollama builds send the message as a bare string
    Text(String),
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorDetail::Object { message } | ErrorDetail::Text(message),
        }) => message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn mentions_model(detail: &str) -> bool {
    detail.to_ascii_lowercase().contains("model")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection failures and timeouts
    Network,
    /// 429 from the endpoint
    RateLimit,
    /// 5xx, including Ollama still loading the model
    ServerError,
    Auth,
    /// The configured model is not pulled on the endpoint
    ModelNotFound,
    InvalidRequest,
    Unknown,
}

impl LlmErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
