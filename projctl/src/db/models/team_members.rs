//! Database models for team members.

use crate::api::models::team_members::TeamMemberCreate;
use crate::types::{ProjectId, TeamMemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for attaching a team member to a project
#[derive(Debug, Clone)]
pub struct TeamMemberCreateDBRequest {
    pub project_id: ProjectId,
    pub profile_url: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
}

impl TeamMemberCreateDBRequest {
    pub fn new(project_id: ProjectId, api: TeamMemberCreate) -> Self {
        Self {
            project_id,
            profile_url: api.profile_url,
            title: api.title,
            role: api.role,
        }
    }
}

/// Database response for a team member
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TeamMemberDBResponse {
    pub id: TeamMemberId,
    pub project_id: ProjectId,
    pub profile_url: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}
