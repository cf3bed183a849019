//! Static workflow guidance
//!
//! Ghostwriter records form a chain: client, project, report, reported
//! finding. Each creation step needs the id produced by the one before it.
//! This module describes that chain as data; the `explain_workflow` tool
//! returns it verbatim and the system prompt embeds a text rendering.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt::Write;

/// Step label: numbered in the creation path, lettered in the search-first path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepLabel {
    Number(u32),
    Label(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowStep {
    pub step: StepLabel,
    pub tool: &'static str,
    pub purpose: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<&'static str>,
    /// Identifier later steps depend on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persists: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowOptions {
    pub create_everything_new: &'static [WorkflowStep],
    pub use_existing_entities: &'static [WorkflowStep],
}

/// Situation and the action that resolves it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowGuidance {
    pub workflow_options: WorkflowOptions,
    pub best_practices: &'static [&'static str],
    #[serde(serialize_with = "scenarios_as_map")]
    pub common_scenarios: &'static [Scenario],
}

fn scenarios_as_map<S: Serializer>(
    scenarios: &&'static [Scenario],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(scenarios.len()))?;
    for scenario in *scenarios {
        map.serialize_entry(scenario.name, scenario.action)?;
    }
    map.end()
}

const fn step(
    step: StepLabel,
    tool: &'static str,
    purpose: &'static str,
    requires: Option<&'static str>,
    returns: Option<&'static str>,
    persists: Option<&'static str>,
) -> WorkflowStep {
    WorkflowStep {
        step,
        tool,
        purpose,
        requires,
        returns,
        persists,
    }
}

const CREATE_EVERYTHING_NEW: &[WorkflowStep] = &[
    step(
        StepLabel::Number(1),
        "generate_ghostwriter_codename",
        "Generate a unique codename",
        None,
        Some("codename (string)"),
        Some("codename"),
    ),
    step(
        StepLabel::Number(2),
        "create_ghostwriter_client",
        "Create client organization",
        Some("codename from step 1"),
        Some("clientId (integer) - SAVE THIS!"),
        Some("clientId"),
    ),
    step(
        StepLabel::Number(3),
        "create_ghostwriter_project",
        "Create project under client",
        Some("clientId from step 2"),
        Some("projectId (integer) - SAVE THIS!"),
        Some("projectId"),
    ),
    step(
        StepLabel::Number(4),
        "create_ghostwriter_report",
        "Create report under project",
        Some("projectId from step 3"),
        Some("reportId (integer) - SAVE THIS!"),
        Some("reportId"),
    ),
    step(
        StepLabel::Number(5),
        "attach_finding_to_report",
        "Add findings to the report",
        Some("reportId from step 4"),
        Some("reportedFindingId (integer) for update_report_finding"),
        Some("reportedFindingId"),
    ),
];

const USE_EXISTING_ENTITIES: &[WorkflowStep] = &[
    step(
        StepLabel::Label("1a"),
        "search_ghostwriter_clients",
        "Check if client already exists",
        None,
        Some("clientId if found, otherwise create new client"),
        Some("clientId"),
    ),
    step(
        StepLabel::Label("2a"),
        "search_ghostwriter_projects",
        "Check if project already exists",
        Some("clientId from step 1a"),
        Some("projectId if found, otherwise create new project"),
        Some("projectId"),
    ),
    step(
        StepLabel::Label("3a"),
        "search_ghostwriter_reports",
        "Check if report already exists",
        Some("projectId from step 2a"),
        Some("reportId if found, otherwise create new report"),
        Some("reportId"),
    ),
    step(
        StepLabel::Label("4a"),
        "attach_finding_to_report",
        "Add findings to existing or new report",
        Some("reportId from step 3a"),
        None,
        Some("reportedFindingId"),
    ),
    step(
        StepLabel::Label("traceback-1"),
        "get_ghostwriter_report_by_id",
        "Given a reportId, retrieve its projectId (to trace back to the project).",
        None,
        None,
        None,
    ),
    step(
        StepLabel::Label("traceback-2"),
        "get_ghostwriter_project_by_id",
        "Given a projectId, retrieve its clientId (to trace back to the client).",
        None,
        None,
        None,
    ),
    step(
        StepLabel::Label("traceback-3"),
        "get_ghostwriter_client_by_id",
        "Given a clientId, retrieve full client details (verify correct client).",
        None,
        None,
        None,
    ),
];

const BEST_PRACTICES: &[&str] = &[
    "Always search first before creating to avoid duplicates",
    "Each step depends on the ID returned from the previous step",
    "Save the 'id' field from each response to use in the next step",
    "You can mix search and create operations as needed",
    "Use search_ghostwriter_findings to find existing findings to attach",
];

const COMMON_SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "new_client_existing_project",
        action: "Search for project, if found use its clientId",
    },
    Scenario {
        name: "existing_client_new_project",
        action: "Search for client, use its ID to create project",
    },
    Scenario {
        name: "add_findings_to_existing_report",
        action: "Search for report, use its ID to attach findings",
    },
];

static GUIDANCE: WorkflowGuidance = WorkflowGuidance {
    workflow_options: WorkflowOptions {
        create_everything_new: CREATE_EVERYTHING_NEW,
        use_existing_entities: USE_EXISTING_ENTITIES,
    },
    best_practices: BEST_PRACTICES,
    common_scenarios: COMMON_SCENARIOS,
};

/// The process-wide workflow description
pub fn guidance() -> &'static WorkflowGuidance {
    &GUIDANCE
}

/// Render the creation chain as plain text for the system prompt
pub fn dependency_summary() -> String {
    let mut out = String::from("WORKFLOW DEPENDENCIES:\n");
    for (i, step) in GUIDANCE
        .workflow_options
        .create_everything_new
        .iter()
        .enumerate()
    {
        let _ = write!(out, "{}. {}: {}", i + 1, step.tool, step.purpose);
        if let Some(requires) = step.requires {
            let _ = write!(out, " (needs {requires})");
        }
        if let Some(persists) = step.persists {
            let _ = write!(out, ", returns {persists}");
        }
        out.push('\n');
    }
    out.push_str("Always follow this sequence when creating new reports from scratch.\n\nBEST PRACTICES:\n");
    for practice in GUIDANCE.best_practices {
        let _ = writeln!(out, "- {practice}");
    }
    out
}
