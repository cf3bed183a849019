//! Direct id lookups and parent/child listings
//!
//! These back the traceback steps of the workflow: report to project to client.

use super::args::{lenient_i64, parse_input};
use super::search::{client_json, project_json};
use super::{InputSchema, ParamType, Tool, ToolContext, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct IdInput {
    #[serde(deserialize_with = "lenient_i64")]
    id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientIdInput {
    #[serde(deserialize_with = "lenient_i64")]
    client_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectIdInput {
    #[serde(deserialize_with = "lenient_i64")]
    project_id: i64,
}

fn id_schema(what: &'static str) -> InputSchema {
    InputSchema::new().required("id", ParamType::Integer, what)
}

pub struct GetClientTool;

#[async_trait]
impl Tool for GetClientTool {
    fn name(&self) -> &'static str {
        "get_ghostwriter_client_by_id"
    }

    fn description(&self) -> String {
        "Fetch a Ghostwriter client directly by ID. Returns full client details. Use it to verify the client at the end of a traceback from a report.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        id_schema("Client id")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: IdInput = parse_input(self.name(), input)?;
        let clients = ctx
            .backend()
            .client_by_id(input.id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(
            clients
                .iter()
                .map(|c| {
                    let mut value = client_json(c);
                    if let Some(map) = value.as_object_mut() {
                        map.remove("_workflow_note");
                    }
                    value
                })
                .collect(),
        ))
    }
}

pub struct GetProjectTool;

#[async_trait]
impl Tool for GetProjectTool {
    fn name(&self) -> &'static str {
        "get_ghostwriter_project_by_id"
    }

    fn description(&self) -> String {
        "Fetch a Ghostwriter project directly by ID. Returns project details including its clientId, which traces the project back to its client.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        id_schema("Project id")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: IdInput = parse_input(self.name(), input)?;
        let projects = ctx
            .backend()
            .project_by_id(input.id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(projects.iter().map(project_json).collect()))
    }
}

pub struct GetReportTool;

#[async_trait]
impl Tool for GetReportTool {
    fn name(&self) -> &'static str {
        "get_ghostwriter_report_by_id"
    }

    fn description(&self) -> String {
        "Fetch a Ghostwriter report directly by ID. Returns report details including its projectId, which traces the report back to its project.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        id_schema("Report id")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: IdInput = parse_input(self.name(), input)?;
        let reports = ctx
            .backend()
            .report_by_id(input.id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(
            reports
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "title": r.title,
                        "projectId": r.project_id,
                        "last_update": r.last_update,
                    })
                })
                .collect(),
        ))
    }
}

pub struct ListClientProjectsTool;

#[async_trait]
impl Tool for ListClientProjectsTool {
    fn name(&self) -> &'static str {
        "list_ghostwriter_client_projects"
    }

    fn description(&self) -> String {
        "List every project that belongs to a client. REQUIRES: clientId from search_ghostwriter_clients or create_ghostwriter_client. Use it to pick an existing project before creating a new one.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new().required("clientId", ParamType::Integer, "Client whose projects to list")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: ClientIdInput = parse_input(self.name(), input)?;
        let projects = ctx
            .backend()
            .projects_by_client(input.client_id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(
            projects
                .iter()
                .map(|p| {
                    json!({
                        "id": p.id,
                        "codename": p.codename,
                        "projectType": p.project_type,
                        "startDate": p.start_date,
                        "endDate": p.end_date,
                        "_workflow_note": format!("Use id={} as projectId for create_ghostwriter_report", p.id),
                    })
                })
                .collect(),
        ))
    }
}

pub struct ListProjectReportsTool;

#[async_trait]
impl Tool for ListProjectReportsTool {
    fn name(&self) -> &'static str {
        "list_ghostwriter_project_reports"
    }

    fn description(&self) -> String {
        "List every report that belongs to a project. REQUIRES: projectId from search_ghostwriter_projects or create_ghostwriter_project.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new().required("projectId", ParamType::Integer, "Project whose reports to list")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: ProjectIdInput = parse_input(self.name(), input)?;
        let reports = ctx
            .backend()
            .reports_by_project(input.project_id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(
            reports
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "title": r.title,
                        "last_update": r.last_update,
                        "_workflow_note": format!("Use id={} as reportId for attach_finding_to_report", r.id),
                    })
                })
                .collect(),
        ))
    }
}
