//! Database repository for team members.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::team_members::{TeamMemberCreateDBRequest, TeamMemberDBResponse},
};
use crate::types::{ProjectId, TeamMemberId};

/// Filter for listing the team members of one project
#[derive(Debug, Clone)]
pub struct TeamMemberFilter {
    pub project_id: ProjectId,
}

impl TeamMemberFilter {
    pub fn new(project_id: ProjectId) -> Self {
        Self { project_id }
    }
}

pub struct TeamMembers<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for TeamMembers<'c> {
    type CreateRequest = TeamMemberCreateDBRequest;
    type Response = TeamMemberDBResponse;
    type Id = TeamMemberId;
    type Filter = TeamMemberFilter;

    /// Insert a member. The project check is part of the INSERT, so the statement takes the
    /// write lock without first holding a read snapshot. Fails with [`DbError::NotFound`] when
    /// the project does not exist.
    #[instrument(skip(self, request), fields(project_id = request.project_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>(
            r#"
            INSERT INTO team_members (project_id, profile_url, title, role, created_at)
            SELECT ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM projects WHERE id = ?)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(&request.profile_url)
        .bind(&request.title)
        .bind(&request.role)
        .bind(Utc::now())
        .bind(request.project_id)
        .fetch_optional(&mut *self.db)
        .await?;

        member.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>("SELECT * FROM team_members WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(member)
    }

    #[instrument(skip(self, filter), fields(project_id = filter.project_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let members = sqlx::query_as::<_, TeamMemberDBResponse>("SELECT * FROM team_members WHERE project_id = ? ORDER BY id")
            .bind(filter.project_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(members)
    }
}

impl<'c> TeamMembers<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Replace a member's role. Fails with [`DbError::NotFound`] when no row was updated.
    #[instrument(skip(self, role), err)]
    pub async fn update_role(&mut self, id: TeamMemberId, role: &str) -> Result<TeamMemberDBResponse> {
        let result = sqlx::query("UPDATE team_members SET role = ? WHERE id = ?")
            .bind(role)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}
