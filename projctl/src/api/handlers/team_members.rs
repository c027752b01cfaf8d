use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::team_members::{TeamMemberCreate, TeamMemberResponse, TeamMemberRoleUpdate},
    db::{
        errors::DbError,
        handlers::{Projects, Repository, TeamMembers, team_members::TeamMemberFilter},
        models::team_members::TeamMemberCreateDBRequest,
    },
    errors::{Error, Result},
    types::{ProjectId, TeamMemberId},
};

fn project_not_found(id: ProjectId) -> Error {
    Error::NotFound {
        resource: "Project".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/projects/{project_id}/team-members",
    tag = "team_members",
    summary = "Add team member",
    request_body = TeamMemberCreate,
    responses(
        (status = 201, description = "Team member added", body = TeamMemberResponse),
        (status = 404, description = "Project not found")
    ),
    params(
        ("project_id" = i64, Path, description = "Project ID")
    )
)]
#[instrument(skip(state, create), err)]
pub async fn add_team_member(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(create): Json<TeamMemberCreate>,
) -> Result<(StatusCode, Json<TeamMemberResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let member = TeamMembers::new(&mut conn)
        .create(&TeamMemberCreateDBRequest::new(project_id, create))
        .await
        .map_err(|e| match e {
            DbError::NotFound => project_not_found(project_id),
            other => Error::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(member.into())))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}/team-members",
    tag = "team_members",
    summary = "List team members",
    responses(
        (status = 200, description = "Team members of the project", body = [TeamMemberResponse]),
        (status = 404, description = "Project not found")
    ),
    params(
        ("project_id" = i64, Path, description = "Project ID")
    )
)]
#[instrument(skip(state), err)]
pub async fn list_team_members(State(state): State<AppState>, Path(project_id): Path<ProjectId>) -> Result<Json<Vec<TeamMemberResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !Projects::new(&mut conn).exists(project_id).await? {
        return Err(project_not_found(project_id));
    }

    let members = TeamMembers::new(&mut conn).list(&TeamMemberFilter::new(project_id)).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/team-members/{member_id}/role",
    tag = "team_members",
    summary = "Update team member role",
    request_body = TeamMemberRoleUpdate,
    responses(
        (status = 200, description = "Updated team member", body = TeamMemberResponse),
        (status = 400, description = "Role is empty"),
        (status = 404, description = "Team member not found")
    ),
    params(
        ("member_id" = i64, Path, description = "Team member ID")
    )
)]
#[instrument(skip(state, update), err)]
pub async fn update_team_member_role(
    State(state): State<AppState>,
    Path(member_id): Path<TeamMemberId>,
    Json(update): Json<TeamMemberRoleUpdate>,
) -> Result<Json<TeamMemberResponse>> {
    let role = update.role.trim();
    if role.is_empty() {
        return Err(Error::BadRequest {
            message: "role must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let member = TeamMembers::new(&mut conn).update_role(member_id, role).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Team member".to_string(),
            id: member_id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(member.into()))
}
