//! Data access to the Ghostwriter report-management backend
//!
//! The orchestration core only sees the [`DataAccess`] trait. The GraphQL
//! binding in [`graphql`] is the production implementation.

mod error;
mod graphql;
mod types;

pub use error::BackendError;
pub use graphql::GraphqlBackend;
pub use types::*;

use async_trait::async_trait;

/// One method per backend operation the tool catalog needs.
///
/// Implementations perform a single request/response unit of work per call.
/// There is no retry at this layer; failures surface as [`BackendError`] and
/// are reported back into the conversation by the tool layer.
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn search_findings(&self, term: &str) -> Result<Vec<FindingSummary>, BackendError>;

    async fn finding_by_id(&self, id: i64) -> Result<Vec<FindingSummary>, BackendError>;

    async fn search_reports(&self, term: &str) -> Result<Vec<ReportRecord>, BackendError>;

    async fn search_clients(&self, term: &str) -> Result<Vec<ClientRecord>, BackendError>;

    async fn search_projects(&self, term: &str) -> Result<Vec<ProjectRecord>, BackendError>;

    async fn client_by_id(&self, id: i64) -> Result<Vec<ClientRecord>, BackendError>;

    async fn project_by_id(&self, id: i64) -> Result<Vec<ProjectRecord>, BackendError>;

    async fn report_by_id(&self, id: i64) -> Result<Vec<ReportRecord>, BackendError>;

    async fn projects_by_client(&self, client_id: i64) -> Result<Vec<ProjectRecord>, BackendError>;

    async fn reports_by_project(&self, project_id: i64) -> Result<Vec<ReportRecord>, BackendError>;

    async fn generate_codename(&self) -> Result<String, BackendError>;

    async fn create_client(&self, client: &NewClient) -> Result<ClientRecord, BackendError>;

    async fn create_project(&self, project: &NewProject) -> Result<CreatedProject, BackendError>;

    async fn create_report(&self, report: &NewReport) -> Result<ReportRecord, BackendError>;

    /// Attach a library finding to a report, returning the reported finding id
    async fn attach_finding(&self, finding_id: i64, report_id: i64) -> Result<i64, BackendError>;

    async fn list_report_findings(
        &self,
        report_id: i64,
    ) -> Result<Vec<ReportedFindingTitle>, BackendError>;

    async fn update_reported_finding(
        &self,
        update: &FindingUpdate,
    ) -> Result<UpdatedFindings, BackendError>;
}
