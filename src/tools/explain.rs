//! Workflow explainer tool

use super::{InputSchema, Tool, ToolContext, ToolError};
use crate::workflow;
use async_trait::async_trait;
use serde_json::Value;

pub struct ExplainWorkflowTool;

#[async_trait]
impl Tool for ExplainWorkflowTool {
    fn name(&self) -> &'static str {
        "explain_workflow"
    }

    fn description(&self) -> String {
        "Explains the complete workflow for creating a new penetration testing report in Ghostwriter, including how to use existing entities. Any arguments are ignored.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
    }

    async fn run(&self, _input: Value, _ctx: ToolContext) -> Result<Value, ToolError> {
        serde_json::to_value(workflow::guidance()).map_err(|e| ToolError::Internal {
            tool: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}
