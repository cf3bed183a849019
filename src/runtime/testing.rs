//! Mock implementations for testing
//!
//! These mocks enable end-to-end orchestration tests without real I/O.

use super::traits::*;
use crate::backend::{
    BackendError, ClientRecord, CreatedProject, DataAccess, FindingSummary, FindingUpdate,
    NewClient, NewProject, NewReport, ProjectRecord, ReportRecord, ReportedFindingTitle,
    UpdatedFinding, UpdatedFindings, UNKNOWN_PROJECT_TYPE,
};
use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, ToolDefinition, Usage};
use crate::tools::{ArgumentRule, ToolError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::unknown("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Response with text only
pub fn text_reply(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::text(text)],
        end_turn: true,
        usage: Usage::default(),
    }
}

/// Response with optional text followed by tool calls `(id, name, input)`
pub fn tool_reply(text: &str, calls: &[(&str, &str, Value)]) -> LlmResponse {
    let mut content = Vec::new();
    if !text.is_empty() {
        content.push(ContentBlock::text(text));
    }
    content.extend(
        calls
            .iter()
            .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone())),
    );
    LlmResponse {
        content,
        end_turn: false,
        usage: Usage::default(),
    }
}

// ============================================================================
// Delayed Mock Tool Executor (for deadline testing)
// ============================================================================

/// Tool executor whose every call sleeps before succeeding
pub struct DelayedToolExecutor {
    delay: Duration,
}

impl DelayedToolExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ToolExecutor for DelayedToolExecutor {
    fn argument_rule(&self, _name: &str) -> Result<ArgumentRule, ToolError> {
        Ok(ArgumentRule::Passthrough)
    }

    async fn execute(&self, _name: &str, _input: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(Value::Null)
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }
}

// ============================================================================
// In-Memory Backend
// ============================================================================

#[derive(Default)]
struct Tables {
    clients: Vec<ClientRecord>,
    projects: Vec<ProjectRecord>,
    reports: Vec<ReportRecord>,
    findings: Vec<FindingSummary>,
    /// (reported finding id, library finding id, report id)
    reported: Vec<(i64, i64, i64)>,
    created_projects: Vec<NewProject>,
    calls: Vec<String>,
}

/// In-memory `DataAccess` that records every call
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    codename: Option<String>,
    failure: Option<String>,
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).unwrap() + 1
}

fn matches(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(&term.to_lowercase())
}

impl MemoryBackend {
    /// Add a client with only name and codename set
    pub fn with_client(self, name: &str, codename: &str) -> Self {
        {
            let mut t = self.tables.lock().unwrap();
            let id = next_id(t.clients.len());
            t.clients.push(ClientRecord {
                id,
                name: name.to_string(),
                codename: codename.to_string(),
                ..ClientRecord::default()
            });
        }
        self
    }

    pub fn with_project(self, client_id: i64, codename: &str, project_type: Option<&str>) -> Self {
        {
            let mut t = self.tables.lock().unwrap();
            let id = next_id(t.projects.len());
            let (client_name, client_codename) = t
                .clients
                .iter()
                .find(|c| c.id == client_id)
                .map(|c| (c.name.clone(), c.codename.clone()))
                .unwrap_or_default();
            t.projects.push(ProjectRecord {
                id,
                codename: codename.to_string(),
                client_id,
                project_type: project_type.unwrap_or(UNKNOWN_PROJECT_TYPE).to_string(),
                client_name,
                client_codename,
                ..ProjectRecord::default()
            });
        }
        self
    }

    pub fn with_report(self, project_id: i64, title: &str) -> Self {
        {
            let mut t = self.tables.lock().unwrap();
            let id = next_id(t.reports.len());
            t.reports.push(ReportRecord {
                id,
                title: title.to_string(),
                project_id,
                last_update: "2024-01-15".to_string(),
            });
        }
        self
    }

    pub fn with_finding(self, title: &str, description: &str) -> Self {
        {
            let mut t = self.tables.lock().unwrap();
            let id = next_id(t.findings.len());
            t.findings.push(FindingSummary {
                id,
                title: title.to_string(),
                severity: "High".to_string(),
                description: description.to_string(),
            });
        }
        self
    }

    /// Codename returned by `generate_codename`
    pub fn with_codename(mut self, codename: &str) -> Self {
        self.codename = Some(codename.to_string());
        self
    }

    /// Make every call fail with a network error
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Calls made so far, formatted as `method(args)`
    pub fn calls(&self) -> Vec<String> {
        self.tables.lock().unwrap().calls.clone()
    }

    pub fn created_projects(&self) -> Vec<NewProject> {
        self.tables.lock().unwrap().created_projects.clone()
    }

    /// Record the call and hand out the tables, or the configured failure
    fn begin(&self, call: String) -> Result<std::sync::MutexGuard<'_, Tables>, BackendError> {
        let mut t = self.tables.lock().unwrap();
        t.calls.push(call);
        match &self.failure {
            Some(message) => Err(BackendError::network(message.clone())),
            None => Ok(t),
        }
    }
}

#[async_trait]
impl DataAccess for MemoryBackend {
    async fn search_findings(&self, term: &str) -> Result<Vec<FindingSummary>, BackendError> {
        let t = self.begin(format!("search_findings({term})"))?;
        Ok(t.findings
            .iter()
            .filter(|f| matches(&f.title, term))
            .cloned()
            .collect())
    }

    async fn finding_by_id(&self, id: i64) -> Result<Vec<FindingSummary>, BackendError> {
        let t = self.begin(format!("finding_by_id({id})"))?;
        Ok(t.findings.iter().filter(|f| f.id == id).cloned().collect())
    }

    async fn search_reports(&self, term: &str) -> Result<Vec<ReportRecord>, BackendError> {
        let t = self.begin(format!("search_reports({term})"))?;
        Ok(t.reports
            .iter()
            .filter(|r| matches(&r.title, term))
            .cloned()
            .collect())
    }

    async fn search_clients(&self, term: &str) -> Result<Vec<ClientRecord>, BackendError> {
        let t = self.begin(format!("search_clients({term})"))?;
        Ok(t.clients
            .iter()
            .filter(|c| matches(&c.name, term) || matches(&c.codename, term))
            .cloned()
            .collect())
    }

    async fn search_projects(&self, term: &str) -> Result<Vec<ProjectRecord>, BackendError> {
        let t = self.begin(format!("search_projects({term})"))?;
        Ok(t.projects
            .iter()
            .filter(|p| {
                matches(&p.codename, term)
                    || matches(&p.client_name, term)
                    || matches(&p.client_codename, term)
            })
            .cloned()
            .collect())
    }

    async fn client_by_id(&self, id: i64) -> Result<Vec<ClientRecord>, BackendError> {
        let t = self.begin(format!("client_by_id({id})"))?;
        Ok(t.clients.iter().filter(|c| c.id == id).cloned().collect())
    }

    async fn project_by_id(&self, id: i64) -> Result<Vec<ProjectRecord>, BackendError> {
        let t = self.begin(format!("project_by_id({id})"))?;
        Ok(t.projects.iter().filter(|p| p.id == id).cloned().collect())
    }

    async fn report_by_id(&self, id: i64) -> Result<Vec<ReportRecord>, BackendError> {
        let t = self.begin(format!("report_by_id({id})"))?;
        Ok(t.reports.iter().filter(|r| r.id == id).cloned().collect())
    }

    async fn projects_by_client(&self, client_id: i64) -> Result<Vec<ProjectRecord>, BackendError> {
        let t = self.begin(format!("projects_by_client({client_id})"))?;
        Ok(t.projects
            .iter()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn reports_by_project(&self, project_id: i64) -> Result<Vec<ReportRecord>, BackendError> {
        let t = self.begin(format!("reports_by_project({project_id})"))?;
        Ok(t.reports
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn generate_codename(&self) -> Result<String, BackendError> {
        let _tables = self.begin("generate_codename()".to_string())?;
        Ok(self.codename.clone().unwrap_or_else(|| "GENERATED".to_string()))
    }

    async fn create_client(&self, client: &NewClient) -> Result<ClientRecord, BackendError> {
        let mut t = self.begin(format!("create_client({})", client.name))?;
        let record = ClientRecord {
            id: next_id(t.clients.len()),
            name: client.name.clone(),
            codename: client.codename.clone(),
            short_name: client.short_name.clone(),
            address: client.address.clone().unwrap_or_default(),
            note: client.note.clone().unwrap_or_default(),
            timezone: client.timezone.clone().unwrap_or_default(),
        };
        t.clients.push(record.clone());
        Ok(record)
    }

    async fn create_project(&self, project: &NewProject) -> Result<CreatedProject, BackendError> {
        let mut t = self.begin(format!(
            "create_project({}, {})",
            project.client_id, project.codename
        ))?;
        t.created_projects.push(project.clone());
        let format_date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let created = CreatedProject {
            id: next_id(t.projects.len()),
            codename: project.codename.clone(),
            start_date: format_date(project.start_date),
            end_date: format_date(project.end_date),
        };
        t.projects.push(ProjectRecord {
            id: created.id,
            codename: created.codename.clone(),
            client_id: project.client_id,
            start_date: created.start_date.clone(),
            end_date: created.end_date.clone(),
            ..ProjectRecord::default()
        });
        Ok(created)
    }

    async fn create_report(&self, report: &NewReport) -> Result<ReportRecord, BackendError> {
        let mut t = self.begin(format!(
            "create_report({}, {})",
            report.project_id, report.title
        ))?;
        let record = ReportRecord {
            id: next_id(t.reports.len()),
            title: report.title.clone(),
            project_id: report.project_id,
            last_update: report.last_update.to_string(),
        };
        t.reports.push(record.clone());
        Ok(record)
    }

    async fn attach_finding(&self, finding_id: i64, report_id: i64) -> Result<i64, BackendError> {
        let mut t = self.begin(format!("attach_finding({finding_id}, {report_id})"))?;
        if !t.findings.iter().any(|f| f.id == finding_id) {
            return Err(BackendError::not_found(format!(
                "No finding with id {finding_id}"
            )));
        }
        let id = next_id(t.reported.len());
        t.reported.push((id, finding_id, report_id));
        Ok(id)
    }

    async fn list_report_findings(
        &self,
        report_id: i64,
    ) -> Result<Vec<ReportedFindingTitle>, BackendError> {
        let t = self.begin(format!("list_report_findings({report_id})"))?;
        Ok(t.reported
            .iter()
            .filter(|(_, _, report)| *report == report_id)
            .filter_map(|(id, finding, _)| {
                t.findings
                    .iter()
                    .find(|f| f.id == *finding)
                    .map(|f| ReportedFindingTitle {
                        id: *id,
                        title: f.title.clone(),
                    })
            })
            .collect())
    }

    async fn update_reported_finding(
        &self,
        update: &FindingUpdate,
    ) -> Result<UpdatedFindings, BackendError> {
        let _tables = self.begin(format!("update_reported_finding({})", update.finding_id))?;
        Ok(UpdatedFindings {
            affected_rows: 1,
            returning: vec![UpdatedFinding {
                id: update.finding_id,
                replication_steps: update.replication_steps.clone().unwrap_or_default(),
                affected_entities: update.affected_entities.clone().unwrap_or_default(),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;
    use crate::llm::LlmErrorKind;
    use crate::runtime::{AgentRuntime, ToolRegistryExecutor};
    use crate::state_machine::{Outcome, RunContext, FALLBACK_ANSWER};
    use crate::tools::{ToolContext, ToolRegistry};
    use serde_json::json;
    use std::sync::Arc;

    type TestRuntime = AgentRuntime<Arc<MockLlmClient>, ToolRegistryExecutor>;

    fn runtime(
        backend: &Arc<MemoryBackend>,
        max_turns: u32,
    ) -> (TestRuntime, Arc<MockLlmClient>) {
        let llm = Arc::new(MockLlmClient::new("mock-model"));
        let registry = Arc::new(ToolRegistry::build().unwrap());
        let tools = ToolRegistryExecutor::new(registry, ToolContext::new(backend.clone()));
        let context = RunContext::new(max_turns).with_retry_base_delay(Duration::ZERO);
        (AgentRuntime::new(llm.clone(), tools, context), llm)
    }

    fn tool_results(messages: &[Message]) -> Vec<(&str, &Value, bool)> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                    ..
                } => Some((tool_use_id.as_str(), content, *is_error)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_text_only_answer_is_verbatim() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(text_reply("Ghostwriter tracks clients, projects and reports."));

        let reply = runtime.run("What can you do?").await;

        assert_eq!(reply.answer, "Ghostwriter tracks clients, projects and reports.");
        assert_eq!(reply.model_turns, 1);
        assert!(backend.calls().is_empty());

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system.contains("WORKFLOW DEPENDENCIES"));
        assert_eq!(requests[0].tools.len(), 17);
    }

    #[tokio::test]
    async fn test_client_search_scenario() {
        let backend = Arc::new(MemoryBackend::default().with_client("Acme Corp", "ACME2024"));
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "",
            &[("call_1", "search_ghostwriter_clients", json!({"__arg1": "Acme"}))],
        ));
        llm.queue_response(text_reply("Found Acme Corp (id 1)."));

        let reply = runtime.run("Find the Acme client").await;

        assert_eq!(reply.answer, "Found Acme Corp (id 1).");
        assert_eq!(backend.calls(), vec!["search_clients(Acme)".to_string()]);
        let results = tool_results(reply.conversation.messages());
        assert_eq!(results.len(), 1);
        let (id, content, is_error) = results[0];
        assert_eq!(id, "call_1");
        assert!(!is_error);
        assert_eq!(content[0]["shortName"], "");
        assert_eq!(content[0]["address"], "");
    }

    #[tokio::test]
    async fn test_codename_flows_into_create_project() {
        let backend = Arc::new(MemoryBackend::default().with_codename("RT2024"));
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "Generating a codename first.",
            &[("call_1", "generate_ghostwriter_codename", json!({"unused": true}))],
        ));
        llm.queue_response(tool_reply(
            "",
            &[(
                "call_2",
                "create_ghostwriter_project",
                json!({"clientId": 123, "projectTypeId": 2}),
            )],
        ));
        llm.queue_response(text_reply("Project RT2024 created."));

        let reply = runtime.run("Create a red team project for client 123").await;

        assert_eq!(
            reply.outcome,
            Outcome::Answered {
                text: "Project RT2024 created.".to_string()
            }
        );
        let created = backend.created_projects();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].codename, "RT2024");
        assert_eq!(created[0].client_id, 123);
    }

    #[tokio::test]
    async fn test_missing_codename_is_reported_to_model() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "",
            &[(
                "call_1",
                "create_ghostwriter_project",
                json!({"clientId": 123, "projectTypeId": 2}),
            )],
        ));
        llm.queue_response(text_reply("I need a codename first."));

        let reply = runtime.run("Create a project for client 123").await;

        assert!(backend.created_projects().is_empty());
        let results = tool_results(reply.conversation.messages());
        let (_, content, is_error) = results[0];
        assert!(is_error);
        assert_eq!(content["kind"], "validation");
        assert!(content["error"].as_str().unwrap().contains("codename"));
        assert_eq!(content["args"], json!({"clientId": 123, "projectTypeId": 2}));

        // The failure is visible to the model on the next turn
        let second = &llm.recorded_requests()[1];
        let last = second.messages.last().unwrap();
        assert!(matches!(
            &last.content[0],
            ContentBlock::ToolResult { is_error: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_update_without_fields_never_hits_backend() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "",
            &[("call_1", "update_report_finding", json!({"findingId": 5}))],
        ));
        llm.queue_response(text_reply("Which field should I update?"));

        let reply = runtime.run("Update finding 5").await;

        assert!(backend.calls().is_empty());
        let results = tool_results(reply.conversation.messages());
        assert_eq!(results[0].1["kind"], "validation");
        assert_eq!(reply.answer, "Which field should I update?");
    }

    #[tokio::test]
    async fn test_budget_stops_after_last_tool_result() {
        let backend = Arc::new(MemoryBackend::default().with_client("Acme Corp", "ACME2024"));
        let (runtime, llm) = runtime(&backend, 2);
        for i in 1..=3 {
            let id = format!("call_{i}");
            llm.queue_response(tool_reply(
                &format!("Searching, attempt {i}"),
                &[(id.as_str(), "search_ghostwriter_clients", json!({"search_term": "Acme"}))],
            ));
        }

        let reply = runtime.run("Keep searching").await;

        assert_eq!(reply.outcome, Outcome::BudgetExhausted);
        assert_eq!(reply.answer, "Searching, attempt 2");
        assert_eq!(llm.recorded_requests().len(), 2);
        assert_eq!(backend.calls().len(), 2);
        assert_eq!(tool_results(reply.conversation.messages()).len(), 2);
    }

    #[tokio::test]
    async fn test_budget_without_text_uses_fallback() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 1);
        llm.queue_response(tool_reply("", &[("call_1", "explain_workflow", json!({}))]));

        let reply = runtime.run("Explain").await;

        assert_eq!(reply.outcome, Outcome::BudgetExhausted);
        assert_eq!(reply.answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_only_first_tool_call_runs() {
        let backend = Arc::new(MemoryBackend::default().with_codename("RT2024"));
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "",
            &[
                ("call_1", "generate_ghostwriter_codename", json!({})),
                ("call_2", "search_ghostwriter_clients", json!({"search_term": "Acme"})),
            ],
        ));
        llm.queue_response(text_reply("Done."));

        let reply = runtime.run("Codename and search").await;

        assert_eq!(backend.calls(), vec!["generate_codename()".to_string()]);
        let second = &llm.recorded_requests()[1];
        let tool_uses: usize = second
            .messages
            .iter()
            .flat_map(|m| &m.content)
            .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
            .count();
        assert_eq!(tool_uses, 1);
        assert_eq!(reply.answer, "Done.");
    }

    #[tokio::test]
    async fn test_retryable_model_error_is_retried() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_error(LlmError::from_status(503, "loading model", "qwen3:14b"));
        llm.queue_error(
            LlmError::from_status(429, "", "qwen3:14b").with_retry_after(Duration::ZERO),
        );
        llm.queue_response(text_reply("Recovered."));

        let reply = runtime.run("Hello").await;

        assert_eq!(reply.answer, "Recovered.");
        assert_eq!(reply.model_turns, 1);
        assert_eq!(llm.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        for _ in 0..3 {
            llm.queue_error(LlmError::network("connection refused"));
        }

        let reply = runtime.run("Hello").await;

        assert_eq!(
            reply.answer,
            "Error running Ghostwriter agent: connection refused"
        );
        assert_eq!(llm.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_error(LlmError::new(LlmErrorKind::Auth, "invalid api key"));

        let reply = runtime.run("Hello").await;

        assert!(matches!(reply.outcome, Outcome::ModelFailed { .. }));
        assert_eq!(reply.answer, "Error running Ghostwriter agent: invalid api key");
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_model_is_reported_once() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_error(LlmError::from_status(
            404,
            r#"{"error":{"message":"model \"qwen3:14b\" not found, try pulling it first"}}"#,
            "qwen3:14b",
        ));

        let reply = runtime.run("Hello").await;

        assert_eq!(llm.recorded_requests().len(), 1);
        assert!(reply
            .answer
            .starts_with("Error running Ghostwriter agent: Model 'qwen3:14b' is not available"));
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_tool_error() {
        let backend = Arc::new(MemoryBackend::default().failing("connection reset"));
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "",
            &[("call_1", "search_ghostwriter_reports", json!({"search_term": "Acme"}))],
        ));
        llm.queue_response(text_reply("Ghostwriter is unreachable."));

        let reply = runtime.run("Find Acme reports").await;

        let results = tool_results(reply.conversation.messages());
        let (_, content, is_error) = results[0];
        assert!(is_error);
        assert_eq!(content["kind"], "backend");
        assert!(content["error"].as_str().unwrap().contains("connection reset"));
        assert_eq!(content["args"], json!({"search_term": "Acme"}));
        assert_eq!(reply.answer, "Ghostwriter is unreachable.");
    }

    #[tokio::test]
    async fn test_continuation_replays_codename() {
        let backend = Arc::new(MemoryBackend::default().with_codename("ACME2024"));
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply(
            "",
            &[("call_1", "generate_ghostwriter_codename", json!({}))],
        ));
        llm.queue_response(text_reply("Codename ACME2024 is ready."));
        let first = runtime.run("Generate a codename").await;

        llm.queue_response(tool_reply(
            "",
            &[(
                "call_2",
                "create_ghostwriter_project",
                json!({"clientId": 7, "projectTypeId": 1, "codename": null}),
            )],
        ));
        llm.queue_response(text_reply("Project created."));
        let second = runtime
            .run_with_history(first.conversation, "Now create the project for client 7")
            .await;

        assert_eq!(second.answer, "Project created.");
        assert_eq!(backend.created_projects()[0].codename, "ACME2024");
        // user, assistant+call, result, assistant, user, assistant+call, result, assistant
        assert_eq!(second.conversation.len(), 8);
    }

    #[tokio::test]
    async fn test_tool_deadline() {
        let llm = Arc::new(MockLlmClient::new("mock-model"));
        llm.queue_response(tool_reply("", &[("call_1", "slow_tool", json!({}))]));
        llm.queue_response(text_reply("It timed out."));
        let runtime = AgentRuntime::new(
            llm.clone(),
            DelayedToolExecutor::new(Duration::from_secs(30)),
            RunContext::new(5).with_retry_base_delay(Duration::ZERO),
        )
        .with_tool_timeout(Duration::from_millis(20));

        let reply = runtime.run("Run the slow tool").await;

        let results = tool_results(reply.conversation.messages());
        assert_eq!(results[0].1["kind"], "timeout");
        assert_eq!(reply.answer, "It timed out.");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_recoverable() {
        let backend = Arc::new(MemoryBackend::default());
        let (runtime, llm) = runtime(&backend, 10);
        llm.queue_response(tool_reply("", &[("call_1", "delete_everything", json!({}))]));
        llm.queue_response(text_reply("That tool does not exist."));

        let reply = runtime.run("Delete everything").await;

        let results = tool_results(reply.conversation.messages());
        assert_eq!(results[0].1["kind"], "unknown_tool");
        assert_eq!(reply.answer, "That tool does not exist.");
    }
}
