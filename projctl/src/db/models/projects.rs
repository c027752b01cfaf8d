//! Database models for projects.

use crate::api::models::projects::LookingFor;
use crate::db::models::team_members::TeamMemberDBResponse;
use crate::types::ProjectId;
use chrono::{DateTime, Utc};

/// Database request for creating a new project together with its attachment rows.
///
/// `pitch_decks` and `images` hold storage names produced by the upload orchestrator;
/// they are written in the same transaction as the project row.
#[derive(Debug, Clone, Default)]
pub struct ProjectCreateDBRequest {
    pub title: String,
    pub subtitle: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub project_value: f64,
    pub looking_for: Vec<LookingFor>,
    pub github_link: Option<String>,
    pub pitch_decks: Vec<String>,
    pub images: Vec<String>,
}

/// Database response for a project, fully joined with its children
#[derive(Debug, Clone)]
pub struct ProjectDBResponse {
    pub id: ProjectId,
    pub title: String,
    pub subtitle: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub project_value: f64,
    pub looking_for: Vec<LookingFor>,
    pub github_link: Option<String>,
    pub pitch_decks: Vec<String>,
    pub images: Vec<String>,
    pub team_members: Vec<TeamMemberDBResponse>,
    pub created_at: DateTime<Utc>,
}
