//! GraphQL binding for the Ghostwriter (Hasura) API
//!
//! Every operation is a single authenticated POST of `{query, variables}`.
//! Nullable fields are defaulted while converting the raw rows into records.

use super::types::{
    ClientRecord, CreatedProject, FindingSummary, FindingUpdate, NewClient, NewProject, NewReport,
    ProjectRecord, ReportRecord, ReportedFindingTitle, UpdatedFinding, UpdatedFindings,
    UNKNOWN_PROJECT_TYPE,
};
use super::{BackendError, DataAccess};
use crate::config::GhostwriterConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const SEARCH_FINDINGS: &str = r"
query ($term: String!) {
  finding(where: {title: {_ilike: $term}}) {
    id
    title
    description
    severity { severity }
  }
}";

const FINDING_BY_ID: &str = r"
query ($id: bigint!) {
  finding(where: {id: {_eq: $id}}) {
    id
    title
    description
    severity { severity }
  }
}";

const SEARCH_REPORTS: &str = r"
query ($term: String!) {
  report(where: {title: {_ilike: $term}}) {
    id
    title
    projectId
    last_update
  }
}";

const SEARCH_CLIENTS: &str = r"
query ($term: String!) {
  client(where: {
    _or: [
      {name: {_ilike: $term}},
      {codename: {_ilike: $term}},
      {shortName: {_ilike: $term}}
    ]
  }) {
    id
    name
    shortName
    codename
    address
    note
    timezone
  }
}";

const SEARCH_PROJECTS: &str = r"
query ($term: String!) {
  project(where: {
    _or: [
      {codename: {_ilike: $term}},
      {client: {name: {_ilike: $term}}},
      {client: {codename: {_ilike: $term}}}
    ]
  }) {
    id
    codename
    clientId
    startDate
    endDate
    note
    projectType { projectType }
    client { name codename }
  }
}";

const CLIENT_BY_ID: &str = r"
query ($clientId: bigint!) {
  client(where: {id: {_eq: $clientId}}) {
    id
    name
    shortName
    codename
    address
    note
    timezone
  }
}";

const PROJECT_BY_ID: &str = r"
query ($projectId: bigint!) {
  project(where: {id: {_eq: $projectId}}) {
    id
    codename
    clientId
    startDate
    endDate
    note
    projectType { projectType }
    client { name codename }
  }
}";

const REPORT_BY_ID: &str = r"
query ($reportId: bigint!) {
  report(where: {id: {_eq: $reportId}}) {
    id
    title
    projectId
    last_update
  }
}";

const PROJECTS_BY_CLIENT: &str = r"
query ($clientId: bigint!) {
  project(where: {clientId: {_eq: $clientId}}) {
    id
    codename
    clientId
    startDate
    endDate
    note
    projectType { projectType }
  }
}";

const REPORTS_BY_PROJECT: &str = r"
query ($projectId: bigint!) {
  report(where: {projectId: {_eq: $projectId}}) {
    id
    title
    projectId
    last_update
  }
}";

const GENERATE_CODENAME: &str = r"
mutation {
  generateCodename { codename }
}";

const CREATE_CLIENT: &str = r"
mutation CreateClient(
  $name: String!,
  $short_name: String!,
  $codename: String!,
  $address: String,
  $note: String,
  $timezone: String
) {
  insert_client(objects: [{
    name: $name,
    shortName: $short_name,
    codename: $codename,
    address: $address,
    note: $note,
    timezone: $timezone
  }]) {
    returning { id name shortName codename address note timezone }
  }
}";

const CREATE_PROJECT: &str = r"
mutation CreateProject(
  $clientId: bigint!,
  $projectTypeId: bigint!,
  $codename: String!,
  $startDate: date,
  $endDate: date
) {
  insert_project(objects: {
    clientId: $clientId,
    projectTypeId: $projectTypeId,
    codename: $codename,
    startDate: $startDate,
    endDate: $endDate
  }) {
    returning { id codename startDate endDate }
  }
}";

const CREATE_REPORT: &str = r"
mutation CreateReport($title: String!, $projectId: bigint!, $lastUpdate: date!) {
  insert_report(objects: {title: $title, projectId: $projectId, last_update: $lastUpdate}) {
    returning { id title projectId last_update }
  }
}";

const ATTACH_FINDING: &str = r"
mutation ($findingId: Int!, $reportId: Int!) {
  attachFinding(findingId: $findingId, reportId: $reportId) { id }
}";

const LIST_REPORT_FINDINGS: &str = r"
query ($reportId: bigint!) {
  reportedFinding(where: {reportId: {_eq: $reportId}}) {
    id
    title
  }
}";

const UPDATE_REPORTED_FINDING: &str = r"
mutation updateFinding($findingId: bigint!, $_set: reportedFinding_set_input) {
  update_reportedFinding(where: {id: {_eq: $findingId}}, _set: $_set) {
    affected_rows
    returning { id replication_steps affectedEntities }
  }
}";

/// Wrap a search term for a case-insensitive substring match
fn ilike(term: &str) -> String {
    format!("%{term}%")
}

/// Ghostwriter GraphQL client
pub struct GraphqlBackend {
    client: Client,
    url: String,
    api_token: String,
}

impl GraphqlBackend {
    pub fn new(url: impl Into<String>, config: &GhostwriterConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| BackendError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_token: config.api_token.clone(),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    BackendError::network(format!("Connection failed: {e}"))
                } else {
                    BackendError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;

        decode(status, &body)
    }
}

/// Turn an HTTP status and body into the typed `data` payload
fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, BackendError> {
    match status {
        200..=299 => {}
        401 | 403 => return Err(BackendError::Auth(body.to_string())),
        _ => {
            return Err(BackendError::Http {
                status,
                body: body.to_string(),
            })
        }
    }

    let envelope: GraphqlResponse<T> = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(format!("{e} - body: {body}")))?;

    if !envelope.errors.is_empty() {
        let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(BackendError::Graphql(messages.join("; ")));
    }

    envelope
        .data
        .ok_or_else(|| BackendError::malformed("response contained no data"))
}

#[async_trait]
impl DataAccess for GraphqlBackend {
    async fn search_findings(&self, term: &str) -> Result<Vec<FindingSummary>, BackendError> {
        let rows: FindingRows = self
            .post(SEARCH_FINDINGS, json!({ "term": ilike(term) }))
            .await?;
        Ok(rows.finding.into_iter().map(Into::into).collect())
    }

    async fn finding_by_id(&self, id: i64) -> Result<Vec<FindingSummary>, BackendError> {
        let rows: FindingRows = self.post(FINDING_BY_ID, json!({ "id": id })).await?;
        Ok(rows.finding.into_iter().map(Into::into).collect())
    }

    async fn search_reports(&self, term: &str) -> Result<Vec<ReportRecord>, BackendError> {
        let rows: ReportRows = self
            .post(SEARCH_REPORTS, json!({ "term": ilike(term) }))
            .await?;
        Ok(rows.report.into_iter().map(Into::into).collect())
    }

    async fn search_clients(&self, term: &str) -> Result<Vec<ClientRecord>, BackendError> {
        let rows: ClientRows = self
            .post(SEARCH_CLIENTS, json!({ "term": ilike(term) }))
            .await?;
        Ok(rows.client.into_iter().map(Into::into).collect())
    }

    async fn search_projects(&self, term: &str) -> Result<Vec<ProjectRecord>, BackendError> {
        let rows: ProjectRows = self
            .post(SEARCH_PROJECTS, json!({ "term": ilike(term) }))
            .await?;
        Ok(rows.project.into_iter().map(Into::into).collect())
    }

    async fn client_by_id(&self, id: i64) -> Result<Vec<ClientRecord>, BackendError> {
        let rows: ClientRows = self.post(CLIENT_BY_ID, json!({ "clientId": id })).await?;
        Ok(rows.client.into_iter().map(Into::into).collect())
    }

    async fn project_by_id(&self, id: i64) -> Result<Vec<ProjectRecord>, BackendError> {
        let rows: ProjectRows = self.post(PROJECT_BY_ID, json!({ "projectId": id })).await?;
        Ok(rows.project.into_iter().map(Into::into).collect())
    }

    async fn report_by_id(&self, id: i64) -> Result<Vec<ReportRecord>, BackendError> {
        let rows: ReportRows = self.post(REPORT_BY_ID, json!({ "reportId": id })).await?;
        Ok(rows.report.into_iter().map(Into::into).collect())
    }

    async fn projects_by_client(&self, client_id: i64) -> Result<Vec<ProjectRecord>, BackendError> {
        let rows: ProjectRows = self
            .post(PROJECTS_BY_CLIENT, json!({ "clientId": client_id }))
            .await?;
        Ok(rows.project.into_iter().map(Into::into).collect())
    }

    async fn reports_by_project(&self, project_id: i64) -> Result<Vec<ReportRecord>, BackendError> {
        let rows: ReportRows = self
            .post(REPORTS_BY_PROJECT, json!({ "projectId": project_id }))
            .await?;
        Ok(rows.report.into_iter().map(Into::into).collect())
    }

    async fn generate_codename(&self) -> Result<String, BackendError> {
        let data: GenerateCodenameData = self.post(GENERATE_CODENAME, json!({})).await?;
        Ok(data.generate_codename.codename)
    }

    async fn create_client(&self, client: &NewClient) -> Result<ClientRecord, BackendError> {
        let data: InsertClientData = self
            .post(
                CREATE_CLIENT,
                json!({
                    "name": client.name,
                    "short_name": client.short_name,
                    "codename": client.codename,
                    "address": client.address,
                    "note": client.note,
                    "timezone": client.timezone,
                }),
            )
            .await?;
        data.insert_client
            .returning
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| BackendError::malformed("Failed to create client - no data returned"))
    }

    async fn create_project(&self, project: &NewProject) -> Result<CreatedProject, BackendError> {
        let data: InsertProjectData = self
            .post(
                CREATE_PROJECT,
                json!({
                    "clientId": project.client_id,
                    "projectTypeId": project.project_type.id(),
                    "codename": project.codename,
                    "startDate": project.start_date.map(|d| d.to_string()),
                    "endDate": project.end_date.map(|d| d.to_string()),
                }),
            )
            .await?;
        let row = data
            .insert_project
            .returning
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::malformed("Failed to create project - no data returned"))?;
        Ok(CreatedProject {
            id: row.id,
            codename: row.codename,
            start_date: row.start_date.unwrap_or_default(),
            end_date: row.end_date.unwrap_or_default(),
        })
    }

    async fn create_report(&self, report: &NewReport) -> Result<ReportRecord, BackendError> {
        let data: InsertReportData = self
            .post(
                CREATE_REPORT,
                json!({
                    "title": report.title,
                    "projectId": report.project_id,
                    "lastUpdate": report.last_update.to_string(),
                }),
            )
            .await?;
        data.insert_report
            .returning
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| BackendError::malformed("Failed to create report - no data returned"))
    }

    async fn attach_finding(&self, finding_id: i64, report_id: i64) -> Result<i64, BackendError> {
        let data: AttachFindingData = self
            .post(
                ATTACH_FINDING,
                json!({ "findingId": finding_id, "reportId": report_id }),
            )
            .await?;
        Ok(data.attach_finding.id)
    }

    async fn list_report_findings(
        &self,
        report_id: i64,
    ) -> Result<Vec<ReportedFindingTitle>, BackendError> {
        let data: ReportedFindingRows = self
            .post(LIST_REPORT_FINDINGS, json!({ "reportId": report_id }))
            .await?;
        Ok(data
            .reported_finding
            .into_iter()
            .map(|row| ReportedFindingTitle {
                id: row.id,
                title: row.title.unwrap_or_default(),
            })
            .collect())
    }

    async fn update_reported_finding(
        &self,
        update: &FindingUpdate,
    ) -> Result<UpdatedFindings, BackendError> {
        let mut set_fields = Map::new();
        if let Some(steps) = &update.replication_steps {
            set_fields.insert("replication_steps".to_string(), json!(steps));
        }
        if let Some(entities) = &update.affected_entities {
            set_fields.insert("affectedEntities".to_string(), json!(entities));
        }
        if set_fields.is_empty() {
            return Err(BackendError::InvalidInput(
                "At least one of replicationSteps or affectedEntities must be provided."
                    .to_string(),
            ));
        }

        let data: UpdateReportedFindingData = self
            .post(
                UPDATE_REPORTED_FINDING,
                json!({ "findingId": update.finding_id, "_set": set_fields }),
            )
            .await?;
        let result = data.update_reported_finding;
        Ok(UpdatedFindings {
            affected_rows: result.affected_rows,
            returning: result
                .returning
                .into_iter()
                .map(|row| UpdatedFinding {
                    id: row.id,
                    replication_steps: row.replication_steps.unwrap_or_default(),
                    affected_entities: row.affected_entities.unwrap_or_default(),
                })
                .collect(),
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FindingRows {
    finding: Vec<RawFinding>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    severity: Option<RawSeverity>,
}

#[derive(Debug, Deserialize)]
struct RawSeverity {
    severity: Option<String>,
}

impl From<RawFinding> for FindingSummary {
    fn from(raw: RawFinding) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            severity: raw.severity.and_then(|s| s.severity).unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClientRows {
    client: Vec<RawClient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClient {
    id: i64,
    name: String,
    #[serde(default)]
    codename: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

impl From<RawClient> for ClientRecord {
    fn from(raw: RawClient) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            codename: raw.codename.unwrap_or_default(),
            short_name: raw.short_name.unwrap_or_default(),
            address: raw.address.unwrap_or_default(),
            note: raw.note.unwrap_or_default(),
            timezone: raw.timezone.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRows {
    project: Vec<RawProject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    id: i64,
    codename: String,
    #[serde(default)]
    client_id: i64,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    project_type: Option<RawProjectType>,
    #[serde(default)]
    client: Option<RawClientRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProjectType {
    project_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClientRef {
    name: Option<String>,
    codename: Option<String>,
}

impl From<RawProject> for ProjectRecord {
    fn from(raw: RawProject) -> Self {
        let (client_name, client_codename) = raw
            .client
            .map(|c| (c.name.unwrap_or_default(), c.codename.unwrap_or_default()))
            .unwrap_or_default();
        Self {
            id: raw.id,
            codename: raw.codename,
            client_id: raw.client_id,
            project_type: raw
                .project_type
                .and_then(|t| t.project_type)
                .unwrap_or_else(|| UNKNOWN_PROJECT_TYPE.to_string()),
            start_date: raw.start_date.unwrap_or_default(),
            end_date: raw.end_date.unwrap_or_default(),
            note: raw.note.unwrap_or_default(),
            client_name,
            client_codename,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReportRows {
    report: Vec<RawReport>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    id: i64,
    title: String,
    #[serde(default, rename = "projectId")]
    project_id: i64,
    #[serde(default)]
    last_update: Option<String>,
}

impl From<RawReport> for ReportRecord {
    fn from(raw: RawReport) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            project_id: raw.project_id,
            last_update: raw.last_update.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateCodenameData {
    #[serde(rename = "generateCodename")]
    generate_codename: CodenameRow,
}

#[derive(Debug, Deserialize)]
struct CodenameRow {
    codename: String,
}

#[derive(Debug, Deserialize)]
struct Returning<T> {
    returning: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct InsertClientData {
    insert_client: Returning<RawClient>,
}

#[derive(Debug, Deserialize)]
struct InsertProjectData {
    insert_project: Returning<RawCreatedProject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCreatedProject {
    id: i64,
    codename: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsertReportData {
    insert_report: Returning<RawReport>,
}

#[derive(Debug, Deserialize)]
struct AttachFindingData {
    #[serde(rename = "attachFinding")]
    attach_finding: IdRow,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ReportedFindingRows {
    #[serde(rename = "reportedFinding")]
    reported_finding: Vec<RawReportedFinding>,
}

#[derive(Debug, Deserialize)]
struct RawReportedFinding {
    id: i64,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateReportedFindingData {
    #[serde(rename = "update_reportedFinding")]
    update_reported_finding: RawUpdateResult,
}

#[derive(Debug, Deserialize)]
struct RawUpdateResult {
    affected_rows: i64,
    #[serde(default)]
    returning: Vec<RawUpdatedFinding>,
}

#[derive(Debug, Deserialize)]
struct RawUpdatedFinding {
    id: i64,
    #[serde(default)]
    replication_steps: Option<String>,
    #[serde(default, rename = "affectedEntities")]
    affected_entities: Option<String>,
}
