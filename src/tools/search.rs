//! Search tools
//!
//! All four accept the same loose argument shapes (see
//! [`ArgumentRule::SearchTerm`]). Digit-only values become id lookups.

use super::normalize::{lookup, ArgumentRule, Lookup};
use super::{InputSchema, ParamType, Tool, ToolContext, ToolError};
use crate::backend::{ClientRecord, FindingSummary, ProjectRecord, ReportRecord};
use async_trait::async_trait;
use serde_json::{json, Value};

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

fn search_schema(what: &'static str) -> InputSchema {
    InputSchema::new()
        .optional("search_term", ParamType::String, what)
        .optional("id", ParamType::Integer, "Exact id to fetch instead of searching")
}

/// First 100 characters of a finding description followed by an ellipsis
pub(super) fn preview(description: &str) -> String {
    let mut preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

pub(super) fn finding_json(finding: &FindingSummary) -> Value {
    json!({
        "id": finding.id,
        "title": finding.title,
        "severity": finding.severity,
        "description": preview(&finding.description),
    })
}

pub(super) fn report_json(report: &ReportRecord) -> Value {
    json!({
        "id": report.id,
        "title": report.title,
        "projectId": report.project_id,
        "_workflow_note": format!("Use id={} as reportId for attach_finding_to_report", report.id),
    })
}

pub(super) fn client_json(client: &ClientRecord) -> Value {
    json!({
        "id": client.id,
        "name": client.name,
        "codename": client.codename,
        "shortName": client.short_name,
        "address": client.address,
        "note": client.note,
        "_workflow_note": format!("Use id={} as clientId for create_ghostwriter_project", client.id),
    })
}

pub(super) fn project_json(project: &ProjectRecord) -> Value {
    json!({
        "id": project.id,
        "codename": project.codename,
        "clientId": project.client_id,
        "projectType": project.project_type,
        "startDate": project.start_date,
        "endDate": project.end_date,
        "note": project.note,
        "clientName": project.client_name,
        "clientCodename": project.client_codename,
        "_workflow_note": format!("Use id={} as projectId for create_ghostwriter_report", project.id),
    })
}

pub struct SearchFindingsTool;

#[async_trait]
impl Tool for SearchFindingsTool {
    fn name(&self) -> &'static str {
        "search_ghostwriter_findings"
    }

    fn description(&self) -> String {
        "Search the Ghostwriter finding library by title or ID. Returns each finding's id (the findingId for attach_finding_to_report), title, severity and a short description.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        search_schema("Part of the finding title, e.g. \"SQL Injection\"")
    }

    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::SearchTerm
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let backend = ctx.backend();
        let findings = match lookup(self.name(), &input)? {
            Lookup::Identifier(id) => backend.finding_by_id(id).await,
            Lookup::SearchTerm(term) => backend.search_findings(&term).await,
        }
        .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(findings.iter().map(finding_json).collect()))
    }
}

pub struct SearchReportsTool;

#[async_trait]
impl Tool for SearchReportsTool {
    fn name(&self) -> &'static str {
        "search_ghostwriter_reports"
    }

    fn description(&self) -> String {
        r#"Search Ghostwriter reports by title or ID.

USE CASE: Find existing reports to work with, or check if a report already exists.
SEARCH BY: Report title (partial matches supported)
RETURNS: List of reports with their IDs and projectIds

Example searches:
- search_ghostwriter_reports("Q4 Pentest") finds "Q4 Pentest Report", "Q4 Pentest Final", etc.
- search_ghostwriter_reports("Web App") finds all reports with "Web App" in the title"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        search_schema("Part of the report title")
    }

    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::SearchTerm
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let backend = ctx.backend();
        let reports = match lookup(self.name(), &input)? {
            Lookup::Identifier(id) => backend.report_by_id(id).await,
            Lookup::SearchTerm(term) => backend.search_reports(&term).await,
        }
        .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(reports.iter().map(report_json).collect()))
    }
}

pub struct SearchClientsTool;

#[async_trait]
impl Tool for SearchClientsTool {
    fn name(&self) -> &'static str {
        "search_ghostwriter_clients"
    }

    fn description(&self) -> String {
        r#"Search for existing Ghostwriter clients by name, codename, shortName, or ID.

USE CASE: Before creating a new client, search to see if it already exists.
SEARCH BY: Client name, codename, or shortName (partial matches supported)
RETURNS: List of clients with their IDs. Use the 'id' field as clientId in create_ghostwriter_project.

Only 'name' and 'codename' are guaranteed; shortName, address and note are empty strings when not set.

Example workflow:
1. Search for existing client by name/codename first
2. If found: use the returned 'id' as clientId
3. If not found: create new client with create_ghostwriter_client"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        search_schema("Client name, codename or short name, e.g. \"Acme\"")
    }

    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::SearchTerm
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let backend = ctx.backend();
        let clients = match lookup(self.name(), &input)? {
            Lookup::Identifier(id) => backend.client_by_id(id).await,
            Lookup::SearchTerm(term) => backend.search_clients(&term).await,
        }
        .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(clients.iter().map(client_json).collect()))
    }
}

pub struct SearchProjectsTool;

#[async_trait]
impl Tool for SearchProjectsTool {
    fn name(&self) -> &'static str {
        "search_ghostwriter_projects"
    }

    fn description(&self) -> String {
        r#"Search for existing Ghostwriter projects by codename, client info, or ID.

USE CASE: Before creating a new project, search to see if it already exists.
SEARCH BY: Project codename, client name, or client codename (partial matches supported)
RETURNS: List of projects with their IDs. Use the 'id' field as projectId in create_ghostwriter_report.

Only 'id', 'codename' and 'clientId' are guaranteed; dates, note and client details are empty when not set, projectType is "Unknown".

Example workflow:
1. Search for existing project by codename/client first
2. If found: use the returned 'id' as projectId
3. If not found: create new project with create_ghostwriter_project"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        search_schema("Project codename, client name or client codename")
    }

    fn argument_rule(&self) -> ArgumentRule {
        ArgumentRule::SearchTerm
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let backend = ctx.backend();
        let projects = match lookup(self.name(), &input)? {
            Lookup::Identifier(id) => backend.project_by_id(id).await,
            Lookup::SearchTerm(term) => backend.search_projects(&term).await,
        }
        .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(projects.iter().map(project_json).collect()))
    }
}
