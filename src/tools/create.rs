//! Creation tools: steps 1 to 3 of the workflow plus codename generation

use super::args::{lenient_i64, parse_date, parse_input};
use super::normalize::ArgumentRule;
use super::{InputSchema, ParamType, Tool, ToolContext, ToolError};
use crate::backend::{NewClient, NewProject, NewReport, ProjectType};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct GenerateCodenameTool;

#[async_trait]
impl Tool for GenerateCodenameTool {
    fn name(&self) -> &'static str {
        "generate_ghostwriter_codename"
    }

    fn description(&self) -> String {
        "Generate a unique codename. Takes no arguments.\n\nNOTE: This is typically used before creating a client or project to get a unique codename. create_ghostwriter_project reuses the most recent codename automatically when none is given.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
    }

    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::NoArguments
    }

    async fn run(&self, _input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let codename = ctx
            .backend()
            .generate_codename()
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;
        Ok(json!({ "codename": codename }))
    }
}

#[derive(Debug, Deserialize)]
struct CreateClientInput {
    name: String,
    #[serde(alias = "shortName")]
    short_name: String,
    codename: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

pub struct CreateClientTool;

#[async_trait]
impl Tool for CreateClientTool {
    fn name(&self) -> &'static str {
        "create_ghostwriter_client"
    }

    fn description(&self) -> String {
        r#"Create a new Ghostwriter client using name, short name, and codename.

DEPENDENCY: This is STEP 1 in the workflow (if client doesn't exist).
RECOMMENDED: First use search_ghostwriter_clients to check if client already exists!
RETURNS: clientId (required for create_ghostwriter_project)

Example workflow:
1. Call search_ghostwriter_clients("ClientName") to check if exists
2. If NOT found: Call generate_ghostwriter_codename() to get a codename
3. Call this function to create client
4. Use the returned 'id' as 'clientId' in create_ghostwriter_project"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required("name", ParamType::String, "Full client name, e.g. \"Acme Corporation\"")
            .required("short_name", ParamType::String, "Abbreviated name, e.g. \"Acme\"")
            .required("codename", ParamType::String, "Unique identifier, e.g. \"ACME2024\"")
            .optional("address", ParamType::String, "Client's physical address")
            .optional("note", ParamType::String, "Additional notes about the client")
            .optional("timezone", ParamType::String, "Client timezone, e.g. \"America/New_York\"")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: CreateClientInput = parse_input(self.name(), input)?;
        let client = ctx
            .backend()
            .create_client(&NewClient {
                name: input.name,
                short_name: input.short_name,
                codename: input.codename,
                address: input.address,
                note: input.note,
                timezone: input.timezone,
            })
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        tracing::info!(client_id = client.id, "Client created");

        Ok(json!({
            "id": client.id,
            "name": client.name,
            "shortName": client.short_name,
            "codename": client.codename,
            "address": client.address,
            "note": client.note,
            "_workflow_note": "Save this 'id' as clientId for create_ghostwriter_project",
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectInput {
    #[serde(deserialize_with = "lenient_i64")]
    client_id: i64,
    #[serde(default)]
    codename: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    project_type_id: i64,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

pub struct CreateProjectTool;

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> &'static str {
        "create_ghostwriter_project"
    }

    fn description(&self) -> String {
        r#"Create a new Ghostwriter project.

DEPENDENCY: This is STEP 2 in the workflow (if project doesn't exist).
RECOMMENDED: First use search_ghostwriter_projects to check if project already exists!
REQUIRES: clientId from create_ghostwriter_client OR search_ghostwriter_clients
RETURNS: projectId (required for create_ghostwriter_report)

Parameters:
- 'clientId': the 'id' from create_ghostwriter_client or search_ghostwriter_clients output
- 'codename': optional when a codename was generated earlier in the conversation
- 'projectTypeId' is an integer (1-5): 1 = Web App, 2 = Red Team, 3 = Mobile App, 4 = Cloud, 5 = Internal
- 'startDate' and 'endDate' should be in ISO format (YYYY-MM-DD)

Example: If search found client {"id": 123, ...}, use clientId=123"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required("clientId", ParamType::Integer, "Client the project belongs to")
            .optional(
                "codename",
                ParamType::String,
                "Project codename; defaults to the most recently generated codename",
            )
            .required(
                "projectTypeId",
                ParamType::Integer,
                "1 = Web App, 2 = Red Team, 3 = Mobile App, 4 = Cloud, 5 = Internal",
            )
            .optional("startDate", ParamType::String, "Start date, YYYY-MM-DD")
            .optional("endDate", ParamType::String, "End date, YYYY-MM-DD")
    }

    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::RecoverCodename
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: CreateProjectInput = parse_input(self.name(), input)?;

        let codename = input
            .codename
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ToolError::validation(
                    self.name(),
                    "codename is required: call generate_ghostwriter_codename first or pass one explicitly",
                )
            })?;
        let project_type = ProjectType::from_id(input.project_type_id).ok_or_else(|| {
            ToolError::validation(
                self.name(),
                format!("projectTypeId must be between 1 and 5, got {}", input.project_type_id),
            )
        })?;
        let start_date = parse_date(self.name(), "startDate", input.start_date.as_deref())?;
        let end_date = parse_date(self.name(), "endDate", input.end_date.as_deref())?;

        let project = ctx
            .backend()
            .create_project(&NewProject {
                client_id: input.client_id,
                codename,
                project_type,
                start_date,
                end_date,
            })
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        tracing::info!(project_id = project.id, "Project created");

        Ok(json!({
            "id": project.id,
            "codename": project.codename,
            "start_date": project.start_date,
            "end_date": project.end_date,
            "_workflow_note": "Save this 'id' as projectId for create_ghostwriter_report",
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReportInput {
    title: String,
    #[serde(deserialize_with = "lenient_i64")]
    project_id: i64,
    #[serde(default, rename = "last_update", alias = "lastUpdate")]
    last_update: Option<String>,
}

pub struct CreateReportTool;

#[async_trait]
impl Tool for CreateReportTool {
    fn name(&self) -> &'static str {
        "create_ghostwriter_report"
    }

    fn description(&self) -> String {
        r#"Create a new Ghostwriter report linked to a project.

DEPENDENCY: This is STEP 3 in the workflow (if report doesn't exist).
RECOMMENDED: First use search_ghostwriter_reports to check if report already exists!
REQUIRES: projectId from create_ghostwriter_project OR search_ghostwriter_projects
RETURNS: reportId (required for attach_finding_to_report)

Parameters:
- 'projectId': the 'id' from create_ghostwriter_project or search_ghostwriter_projects output
- 'last_update': date the report was last updated in YYYY-MM-DD, defaults to today

Example: If search found project {"id": 456, ...}, use projectId=456"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required("title", ParamType::String, "Report title")
            .required("projectId", ParamType::Integer, "Project the report belongs to")
            .optional("last_update", ParamType::String, "Last update date, YYYY-MM-DD")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: CreateReportInput = parse_input(self.name(), input)?;
        let last_update = parse_date(self.name(), "last_update", input.last_update.as_deref())?
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let report = ctx
            .backend()
            .create_report(&NewReport {
                title: input.title,
                project_id: input.project_id,
                last_update,
            })
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        tracing::info!(report_id = report.id, "Report created");

        Ok(json!({
            "id": report.id,
            "title": report.title,
            "project_id": report.project_id,
            "last_update": report.last_update,
            "_workflow_note": "Save this 'id' as reportId for attach_finding_to_report",
        }))
    }
}
