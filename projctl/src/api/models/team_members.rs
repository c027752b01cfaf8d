//! API request/response models for team members.

use crate::db::models::team_members::TeamMemberDBResponse;
use crate::types::{ProjectId, TeamMemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberCreate {
    pub profile_url: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberRoleUpdate {
    /// New role, must not be blank
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TeamMemberResponse {
    pub id: TeamMemberId,
    pub project_id: ProjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TeamMemberDBResponse> for TeamMemberResponse {
    fn from(db: TeamMemberDBResponse) -> Self {
        Self {
            id: db.id,
            project_id: db.project_id,
            profile_url: db.profile_url,
            title: db.title,
            role: db.role,
            created_at: db.created_at,
        }
    }
}
