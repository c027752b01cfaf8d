//! API request/response models for projects.

use super::pagination::Pagination;
use super::team_members::TeamMemberResponse;
use crate::db::models::projects::ProjectDBResponse;
use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// What a project is looking for. Stored as a comma-separated list on the project row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum LookingFor {
    Investment,
    Employees,
    Partners,
    Buyers,
}

impl LookingFor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookingFor::Investment => "Investment",
            LookingFor::Employees => "Employees",
            LookingFor::Partners => "Partners",
            LookingFor::Buyers => "Buyers",
        }
    }

    /// Join tags into the stored representation
    pub fn join(values: &[LookingFor]) -> String {
        values.iter().map(LookingFor::as_str).collect::<Vec<_>>().join(",")
    }

    /// Parse the stored representation, skipping (and logging) values that are no longer known
    pub fn split(stored: &str) -> Vec<LookingFor> {
        stored
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match s.parse() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Skipping stored looking_for value: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl fmt::Display for LookingFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookingFor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Investment" => Ok(LookingFor::Investment),
            "Employees" => Ok(LookingFor::Employees),
            "Partners" => Ok(LookingFor::Partners),
            "Buyers" => Ok(LookingFor::Buyers),
            other => Err(format!("invalid looking_for value: {other:?}")),
        }
    }
}

/// Multipart form accepted by `POST /projects`.
///
/// Only used to describe the request body in the OpenAPI document; the handler reads the
/// multipart stream field by field.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ProjectCreateForm {
    pub title: String,
    pub subtitle: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    /// Decimal number, must not be negative
    pub project_value: Option<f64>,
    pub github_link: Option<String>,
    /// May be repeated
    pub looking_for: Vec<LookingFor>,
    /// Pitch decks (`.pdf`), may be repeated
    #[schema(value_type = Vec<String>, format = Binary)]
    pub pdfs: Vec<Vec<u8>>,
    /// Images (`.jpg`, `.jpeg`, `.png`, `.svg`), may be repeated
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: ProjectId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_value: f64,
    pub looking_for: Vec<LookingFor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    /// Storage names of the pitch decks, retrievable through `/projects/file/{filename}`
    pub pitch_decks: Vec<String>,
    /// Storage names of the images, retrievable through `/projects/file/{filename}`
    pub images: Vec<String>,
    pub team_members: Vec<TeamMemberResponse>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing projects
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListProjectsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

impl From<ProjectDBResponse> for ProjectResponse {
    fn from(db: ProjectDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            subtitle: db.subtitle,
            industry: db.industry,
            description: db.description,
            project_value: db.project_value,
            looking_for: db.looking_for,
            github_link: db.github_link,
            pitch_decks: db.pitch_decks,
            images: db.images,
            team_members: db.team_members.into_iter().map(Into::into).collect(),
            created_at: db.created_at,
        }
    }
}
