//! Ghostwriter tool catalog
//!
//! Tools are stateless singletons. Everything a call needs arrives through
//! [`ToolContext`], so one [`ToolRegistry`] can be shared by concurrent runs.

mod args;
mod create;
mod error;
mod explain;
mod findings;
mod lookup;
pub mod normalize;
mod schema;
mod search;

pub use create::{CreateClientTool, CreateProjectTool, CreateReportTool, GenerateCodenameTool};
pub use error::ToolError;
pub use explain::ExplainWorkflowTool;
pub use findings::{AttachFindingTool, ListReportFindingsTool, UpdateReportFindingTool};
pub use lookup::{
    GetClientTool, GetProjectTool, GetReportTool, ListClientProjectsTool, ListProjectReportsTool,
};
pub use normalize::{ArgumentMemory, ArgumentRule, Lookup};
pub use schema::{InputSchema, ParamType};
pub use search::{SearchClientsTool, SearchFindingsTool, SearchProjectsTool, SearchReportsTool};

use crate::backend::DataAccess;
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// All context needed for a tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    backend: Arc<dyn DataAccess>,
}

impl ToolContext {
    pub fn new(backend: Arc<dyn DataAccess>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn DataAccess {
        self.backend.as_ref()
    }
}

/// Trait for tools that can be executed by the agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for LLM, including where the tool sits in the workflow
    fn description(&self) -> String;

    /// Declared parameters
    fn input_schema(&self) -> InputSchema;

    /// How raw model arguments are rewritten before [`Tool::run`]
    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::Passthrough
    }

    /// Execute the tool against already-normalized input
    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError>;
}

/// Collection of tools available to the agent
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the full Ghostwriter catalog
    pub fn build() -> Result<Self, ToolError> {
        let catalog: Vec<Arc<dyn Tool>> = vec![
            Arc::new(SearchFindingsTool),
            Arc::new(SearchReportsTool),
            Arc::new(SearchClientsTool),
            Arc::new(SearchProjectsTool),
            Arc::new(GetClientTool),
            Arc::new(GetProjectTool),
            Arc::new(GetReportTool),
            Arc::new(ListClientProjectsTool),
            Arc::new(ListProjectReportsTool),
            Arc::new(GenerateCodenameTool),
            Arc::new(CreateClientTool),
            Arc::new(CreateProjectTool),
            Arc::new(CreateReportTool),
            Arc::new(AttachFindingTool),
            Arc::new(ListReportFindingsTool),
            Arc::new(UpdateReportFindingTool),
            Arc::new(ExplainWorkflowTool),
        ];

        let mut registry = Self::new();
        for tool in catalog {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(ToolError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn Tool>, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema().to_json(),
            })
            .collect()
    }

    /// Argument rule declared by the named tool
    pub fn argument_rule(&self, name: &str) -> Result<ArgumentRule, ToolError> {
        Ok(self.resolve(name)?.argument_rule())
    }

    /// Run a tool by name, returning its native result
    pub async fn dispatch(
        &self,
        name: &str,
        args: Value,
        ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        let tool = self.resolve(name)?;
        tool.run(args, ctx).await
    }

    /// Run a tool by name with its argument rule applied.
    ///
    /// Failures are folded into an `{"error": ...}` object.
    pub async fn invoke(&self, name: &str, args: Value, ctx: ToolContext) -> Value {
        let result = async {
            let rule = self.argument_rule(name)?;
            let args = normalize::normalize(name, rule, args, &ArgumentMemory::default())?;
            self.dispatch(name, args, ctx).await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(tool = %name, error = %e, "Tool invocation failed");
            json!({ "error": e.to_string() })
        })
    }
}
