//! Database repository for projects.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use crate::api::models::projects::LookingFor;
use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::{
        projects::{ProjectCreateDBRequest, ProjectDBResponse},
        team_members::TeamMemberDBResponse,
    },
};
use crate::types::ProjectId;

/// Filter for listing projects
#[derive(Debug, Clone)]
pub struct ProjectFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ProjectFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Project {
    id: ProjectId,
    title: String,
    subtitle: Option<String>,
    industry: Option<String>,
    description: Option<String>,
    project_value: f64,
    looking_for: String,
    github_link: Option<String>,
    created_at: DateTime<Utc>,
}

/// Attachment and team member rows of a set of projects
#[derive(Debug, Default)]
struct Children {
    pitch_decks: HashMap<ProjectId, Vec<String>>,
    images: HashMap<ProjectId, Vec<String>>,
    team_members: HashMap<ProjectId, Vec<TeamMemberDBResponse>>,
}

impl Children {
    fn attach(&mut self, project: Project) -> ProjectDBResponse {
        ProjectDBResponse {
            pitch_decks: self.pitch_decks.remove(&project.id).unwrap_or_default(),
            images: self.images.remove(&project.id).unwrap_or_default(),
            team_members: self.team_members.remove(&project.id).unwrap_or_default(),
            id: project.id,
            title: project.title,
            subtitle: project.subtitle,
            industry: project.industry,
            description: project.description,
            project_value: project.project_value,
            looking_for: LookingFor::split(&project.looking_for),
            github_link: project.github_link,
            created_at: project.created_at,
        }
    }
}

pub struct Projects<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Projects<'c> {
    type CreateRequest = ProjectCreateDBRequest;
    type Response = ProjectDBResponse;
    type Id = ProjectId;
    type Filter = ProjectFilter;

    /// Insert the project row and its attachment rows.
    ///
    /// Runs in its own transaction, which becomes a savepoint when the caller already holds one.
    #[instrument(skip(self, request), fields(title = %request.title, pitch_decks = request.pitch_decks.len(), images = request.images.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let created_at = Utc::now();
        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO projects (title, subtitle, industry, description, project_value, looking_for, github_link, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.title)
        .bind(&request.subtitle)
        .bind(&request.industry)
        .bind(&request.description)
        .bind(request.project_value)
        .bind(LookingFor::join(&request.looking_for))
        .bind(&request.github_link)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_file_paths(&mut tx, "project_pitch_decks", id, &request.pitch_decks).await?;
        insert_file_paths(&mut tx, "project_images", id, &request.images).await?;

        tx.commit().await?;

        Ok(ProjectDBResponse {
            id,
            title: request.title.clone(),
            subtitle: request.subtitle.clone(),
            industry: request.industry.clone(),
            description: request.description.clone(),
            project_value: request.project_value,
            looking_for: request.looking_for.clone(),
            github_link: request.github_link.clone(),
            pitch_decks: request.pitch_decks.clone(),
            images: request.images.clone(),
            team_members: Vec::new(),
            created_at,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        let Some(project) = project else {
            return Ok(None);
        };

        let mut children = self.load_children(&[id]).await?;
        Ok(Some(children.attach(project)))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let projects = sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY id DESC LIMIT ? OFFSET ?")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        let ids: Vec<ProjectId> = projects.iter().map(|p| p.id).collect();
        let mut children = self.load_children(&ids).await?;

        Ok(projects.into_iter().map(|project| children.attach(project)).collect())
    }
}

impl<'c> Projects<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, id: ProjectId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    async fn load_children(&mut self, ids: &[ProjectId]) -> Result<Children> {
        if ids.is_empty() {
            return Ok(Children::default());
        }

        let pitch_decks = self.file_paths("project_pitch_decks", ids).await?;
        let images = self.file_paths("project_images", ids).await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM team_members WHERE project_id IN (");
        push_id_list(&mut query, ids);
        query.push(" ORDER BY id");
        let members: Vec<TeamMemberDBResponse> = query.build_query_as().fetch_all(&mut *self.db).await?;

        let mut team_members: HashMap<ProjectId, Vec<TeamMemberDBResponse>> = HashMap::new();
        for member in members {
            team_members.entry(member.project_id).or_default().push(member);
        }

        Ok(Children {
            pitch_decks,
            images,
            team_members,
        })
    }

    async fn file_paths(&mut self, table: &'static str, ids: &[ProjectId]) -> Result<HashMap<ProjectId, Vec<String>>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT project_id, file_path FROM {table} WHERE project_id IN ("));
        push_id_list(&mut query, ids);
        query.push(" ORDER BY id");

        let rows: Vec<(ProjectId, String)> = query.build_query_as().fetch_all(&mut *self.db).await?;

        let mut paths: HashMap<ProjectId, Vec<String>> = HashMap::new();
        for (project_id, file_path) in rows {
            paths.entry(project_id).or_default().push(file_path);
        }
        Ok(paths)
    }
}

/// Push `?, ?, ...)` binding every id
fn push_id_list(query: &mut QueryBuilder<'_, Sqlite>, ids: &[ProjectId]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

/// Batch-insert `(project_id, file_path)` rows into an attachment table in one statement
async fn insert_file_paths(conn: &mut SqliteConnection, table: &'static str, project_id: ProjectId, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {table} (project_id, file_path) "));
    query.push_values(paths, |mut row, path| {
        row.push_bind(project_id).push_bind(path.as_str());
    });
    query.build().execute(&mut *conn).await?;
    Ok(())
}
