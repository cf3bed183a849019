//! Reported finding tools: steps 4 and 5 of the workflow

use super::args::{lenient_i64, parse_input};
use super::normalize::{classify, Lookup};
use super::{InputSchema, ParamType, Tool, ToolContext, ToolError};
use crate::backend::{BackendError, FindingUpdate};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachFindingInput {
    #[serde(alias = "findingId", alias = "findingID")]
    finding: Value,
    #[serde(deserialize_with = "lenient_i64")]
    report_id: i64,
}

pub struct AttachFindingTool;

#[async_trait]
impl Tool for AttachFindingTool {
    fn name(&self) -> &'static str {
        "attach_finding_to_report"
    }

    fn description(&self) -> String {
        r#"Attach a finding from the library to a report.

DEPENDENCY: This is STEP 4 in the workflow.
REQUIRES: reportId from create_ghostwriter_report OR search_ghostwriter_reports
RETURNS: reportedFindingId (required for update_report_finding)

Parameters:
- 'finding': Either a finding ID (int) or a title to search for; the first matching finding is used
- 'reportId': the 'id' from create_ghostwriter_report or search_ghostwriter_reports output

Example: If search found report {"id": 789, ...}, use reportId=789"#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(
                "finding",
                ParamType::IntegerOrString,
                "Library finding id, or part of its title",
            )
            .required("reportId", ParamType::Integer, "Report to attach the finding to")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: AttachFindingInput = parse_input(self.name(), input)?;
        let backend = ctx.backend();

        let classified =
            classify(&input.finding).map_err(|e| ToolError::validation(self.name(), e.to_string()))?;
        let finding_id = match classified {
            Some(Lookup::Identifier(id)) => id,
            Some(Lookup::SearchTerm(title)) => {
                let matches = backend
                    .search_findings(&title)
                    .await
                    .map_err(|e| ToolError::backend(self.name(), e))?;
                let first = matches.first().ok_or_else(|| {
                    ToolError::backend(
                        self.name(),
                        BackendError::not_found(format!("No finding found with title like: '{title}'")),
                    )
                })?;
                tracing::debug!(title = %title, finding_id = first.id, "Resolved finding by title");
                first.id
            }
            None => {
                return Err(ToolError::validation(
                    self.name(),
                    "finding must be a finding id or title",
                ))
            }
        };

        let reported_finding_id = backend
            .attach_finding(finding_id, input.report_id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(json!({
            "reportedFindingId": reported_finding_id,
            "usedFindingId": finding_id,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportIdInput {
    #[serde(deserialize_with = "lenient_i64")]
    report_id: i64,
}

pub struct ListReportFindingsTool;

#[async_trait]
impl Tool for ListReportFindingsTool {
    fn name(&self) -> &'static str {
        "list_report_finding"
    }

    fn description(&self) -> String {
        "List only the IDs and titles of findings attached to a report. The ids are reportedFindingIds usable with update_report_finding.".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new().required("reportId", ParamType::Integer, "Report to list")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: ReportIdInput = parse_input(self.name(), input)?;
        let findings = ctx
            .backend()
            .list_report_findings(input.report_id)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        Ok(Value::Array(
            findings
                .iter()
                .map(|f| json!({ "id": f.id, "title": f.title }))
                .collect(),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFindingInput {
    #[serde(alias = "reportedFindingId", deserialize_with = "lenient_i64")]
    finding_id: i64,
    #[serde(default)]
    replication_steps: Option<String>,
    #[serde(default)]
    affected_entities: Option<String>,
}

pub struct UpdateReportFindingTool;

#[async_trait]
impl Tool for UpdateReportFindingTool {
    fn name(&self) -> &'static str {
        "update_report_finding"
    }

    fn description(&self) -> String {
        r#"Update the replication steps and/or affected entities of a reported finding.
Note: This will replace the current text, not append to it.

DEPENDENCY: This is STEP 5 in the workflow.
REQUIRES: findingId = reportedFindingId from attach_finding_to_report result.

Parameters:
- 'findingId': the reportedFindingId of the finding that was just attached to the report
- 'replicationSteps': how to reproduce the finding (optional)
- 'affectedEntities': the assets or hosts affected by the finding (optional)
At least one of replicationSteps or affectedEntities must be provided."#
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(
                "findingId",
                ParamType::Integer,
                "reportedFindingId returned by attach_finding_to_report",
            )
            .optional("replicationSteps", ParamType::String, "Steps to reproduce the finding")
            .optional("affectedEntities", ParamType::String, "Affected assets or hosts")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let input: UpdateFindingInput = parse_input(self.name(), input)?;
        let update = FindingUpdate {
            finding_id: input.finding_id,
            replication_steps: input.replication_steps,
            affected_entities: input.affected_entities,
        };
        if update.is_empty() {
            return Err(ToolError::validation(
                self.name(),
                "At least one of replicationSteps or affectedEntities must be provided.",
            ));
        }

        let updated = ctx
            .backend()
            .update_reported_finding(&update)
            .await
            .map_err(|e| ToolError::backend(self.name(), e))?;

        serde_json::to_value(updated).map_err(|e| {
            ToolError::backend(self.name(), BackendError::malformed(e.to_string()))
        })
    }
}
