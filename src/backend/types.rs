//! Record types exchanged with the backend
//!
//! Optional backend fields are already defaulted here: absent text becomes
//! an empty string and an absent project type becomes [`UNKNOWN_PROJECT_TYPE`].

use chrono::NaiveDate;
use serde::Serialize;

/// Sentinel used when a project has no project type
pub const UNKNOWN_PROJECT_TYPE: &str = "Unknown";

/// Library finding as returned by searches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindingSummary {
    pub id: i64,
    pub title: String,
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
    pub codename: String,
    pub short_name: String,
    pub address: String,
    pub note: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: i64,
    pub codename: String,
    pub client_id: i64,
    pub project_type: String,
    pub start_date: String,
    pub end_date: String,
    pub note: String,
    pub client_name: String,
    pub client_codename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRecord {
    pub id: i64,
    pub title: String,
    pub project_id: i64,
    pub last_update: String,
}

/// Project as returned by the insert mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedProject {
    pub id: i64,
    pub codename: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFindingTitle {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub short_name: String,
    pub codename: String,
    pub address: Option<String>,
    pub note: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub client_id: i64,
    pub codename: String,
    pub project_type: ProjectType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub title: String,
    pub project_id: i64,
    pub last_update: NaiveDate,
}

/// Ghostwriter's built-in project types, keyed by their database id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    WebApp = 1,
    RedTeam = 2,
    MobileApp = 3,
    Cloud = 4,
    Internal = 5,
}

impl ProjectType {
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::WebApp),
            2 => Some(Self::RedTeam),
            3 => Some(Self::MobileApp),
            4 => Some(Self::Cloud),
            5 => Some(Self::Internal),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }
}

/// Replacement text for a reported finding. At least one field must be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingUpdate {
    pub finding_id: i64,
    pub replication_steps: Option<String>,
    pub affected_entities: Option<String>,
}

impl FindingUpdate {
    pub fn is_empty(&self) -> bool {
        self.replication_steps.is_none() && self.affected_entities.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatedFindings {
    pub affected_rows: i64,
    pub returning: Vec<UpdatedFinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedFinding {
    pub id: i64,
    pub replication_steps: String,
    #[serde(rename = "affectedEntities")]
    pub affected_entities: String,
}
