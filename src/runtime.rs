//! Runtime for executing orchestration runs
//!
//! The executor owns the I/O: it queries the model, dispatches tools and
//! appends to the conversation as the state machine directs.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{AgentReply, AgentRuntime};
pub use traits::*;

use crate::backend::{BackendError, GraphqlBackend};
use crate::config::{AgentConfig, ConfigError};
use crate::llm::{LlmError, LlmService, LoggingService, OpenAIService};
use crate::state_machine::RunContext;
use crate::tools::{ToolContext, ToolError, ToolRegistry};
use std::sync::Arc;
use thiserror::Error;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = AgentRuntime<ServiceLlmClient, ToolRegistryExecutor>;

/// Failure assembling the production runtime
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Tools(#[from] ToolError),
}

/// Shared handles reused by every run of one process
pub struct Services {
    pub registry: Arc<ToolRegistry>,
    pub tool_context: ToolContext,
}

impl Services {
    /// Connect the GraphQL backend and build the tool catalog
    pub fn connect(config: &AgentConfig) -> Result<Self, StartupError> {
        let endpoint = config.ghostwriter.endpoint()?;
        let backend = GraphqlBackend::new(endpoint, &config.ghostwriter)?;
        let registry = ToolRegistry::build()?;
        tracing::info!(endpoint = %endpoint, tools = registry.len(), "Connected to Ghostwriter");
        Ok(Self {
            registry: Arc::new(registry),
            tool_context: ToolContext::new(Arc::new(backend)),
        })
    }

    /// Runtime over these services talking to the configured model
    pub fn runtime(&self, config: &AgentConfig) -> Result<ProductionRuntime, StartupError> {
        let service: Arc<dyn LlmService> = Arc::new(OpenAIService::new(&config.llm)?);
        let llm = ServiceLlmClient::new(Arc::new(LoggingService::new(service)));
        let tools = ToolRegistryExecutor::new(self.registry.clone(), self.tool_context.clone());
        Ok(AgentRuntime::new(llm, tools, RunContext::new(config.max_turns))
            .with_tool_timeout(config.tool_timeout))
    }
}
