//! LLM provider abstraction
//!
//! The agent talks to a single OpenAI-compatible endpoint through [`LlmService`].

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::{OpenAIService, POSITIONAL_ARGUMENT};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// A chat completion endpoint the orchestrator can query
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Model name sent with every request
    fn model_id(&self) -> &str;
}

/// Records one structured log line per model query
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let result = self.inner.complete(request).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let model = self.inner.model_id();

        match &result {
            Ok(response) => {
                let calls: Vec<&str> = response.tool_uses().iter().map(|(_, name, _)| *name).collect();
                tracing::info!(
                    model,
                    elapsed_ms,
                    history = request.messages.len(),
                    tools_offered = request.tools.len(),
                    ?calls,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Model replied"
                );
            }
            Err(e) if e.kind == LlmErrorKind::ModelNotFound => {
                tracing::error!(model, elapsed_ms, error = %e, "Configured model is not available on the endpoint");
            }
            Err(e) => {
                tracing::warn!(
                    model,
                    elapsed_ms,
                    kind = ?e.kind,
                    retryable = e.kind.is_retryable(),
                    retry_after_ms = e.retry_after.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                    error = %e,
                    "Model query failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
