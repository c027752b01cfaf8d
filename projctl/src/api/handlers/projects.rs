use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::projects::{ListProjectsQuery, LookingFor, ProjectResponse},
    db::{
        handlers::{Projects, Repository, projects::ProjectFilter},
        models::projects::ProjectCreateDBRequest,
    },
    errors::{Error, Result},
    ingest::{ProjectCreator, UploadOrchestrator, UploadTask},
    types::ProjectId,
};

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::PayloadTooLarge;
    }
    Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    }
}

/// Text fields are optional unless blank-checked; whitespace-only values count as absent
fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    summary = "Create project",
    description = "Create a project and store its pitch decks and images. Either the project and all of its files are saved, or nothing is.",
    request_body(
        content_type = "multipart/form-data",
        content = crate::api::models::projects::ProjectCreateForm,
        description = "Project fields plus repeated `pdfs` and `images` file parts"
    ),
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid field value or file type"),
        (status = 413, description = "Payload too large"),
        (status = 500, description = "Storage or database failure")
    )
)]
#[instrument(skip_all, err)]
pub async fn create_project(State(state): State<AppState>, mut multipart: Multipart) -> Result<(StatusCode, Json<ProjectResponse>)> {
    let mut request = ProjectCreateDBRequest::default();
    let mut pitch_decks = Vec::new();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "pdfs" | "images" => {
                let original_name = field.file_name().unwrap_or("").to_string();
                let content = field.bytes().await.map_err(multipart_error)?;
                let task = if field_name == "pdfs" {
                    UploadTask::pitch_deck(original_name, content)
                } else {
                    UploadTask::image(original_name, content)
                };
                tracing::debug!(field = %field_name, filename = %task.original_name, size = task.content.len(), "Received file part");
                if field_name == "pdfs" {
                    pitch_decks.push(task);
                } else {
                    images.push(task);
                }
            }
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                match field_name.as_str() {
                    "title" => request.title = value.trim().to_string(),
                    "subtitle" => request.subtitle = non_empty(value),
                    "industry" => request.industry = non_empty(value),
                    "description" => request.description = non_empty(value),
                    "github_link" => request.github_link = non_empty(value),
                    "project_value" => {
                        let value = value.trim();
                        if !value.is_empty() {
                            request.project_value = value.parse().map_err(|_| Error::BadRequest {
                                message: "Invalid project_value format".to_string(),
                            })?;
                        }
                    }
                    "looking_for" => {
                        let tag = value.parse::<LookingFor>().map_err(|e| Error::BadRequest {
                            message: format!("Invalid looking_for: {}", e),
                        })?;
                        if !request.looking_for.contains(&tag) {
                            request.looking_for.push(tag);
                        }
                    }
                    other => {
                        tracing::debug!(field = %other, "Ignoring unknown multipart field");
                    }
                }
            }
        }
    }

    if request.title.is_empty() {
        return Err(Error::BadRequest {
            message: "title is required".to_string(),
        });
    }
    if !request.project_value.is_finite() || request.project_value < 0.0 {
        return Err(Error::BadRequest {
            message: "project_value must be a non-negative number".to_string(),
        });
    }

    let orchestrator = UploadOrchestrator::new(state.storage.clone(), state.config.uploads.max_concurrency);
    let creator = ProjectCreator::new(state.db.clone(), orchestrator);
    let project = creator.create(request, pitch_decks, images).await?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    summary = "List projects",
    description = "Returns projects, newest first, each with its team members and files.",
    params(ListProjectsQuery),
    responses(
        (status = 200, description = "Projects", body = [ProjectResponse]),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip(state), err)]
pub async fn list_projects(State(state): State<AppState>, Query(query): Query<ListProjectsQuery>) -> Result<Json<Vec<ProjectResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = ProjectFilter::new(query.pagination.skip(), query.pagination.limit());
    let projects = Projects::new(&mut conn).list(&filter).await?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Get project",
    responses(
        (status = 200, description = "Project with team members and files", body = ProjectResponse),
        (status = 400, description = "Invalid project ID"),
        (status = 404, description = "Project not found")
    ),
    params(
        ("id" = i64, Path, description = "Project ID")
    )
)]
#[instrument(skip(state), err)]
pub async fn get_project(State(state): State<AppState>, Path(id): Path<ProjectId>) -> Result<Json<ProjectResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let project = Projects::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Project".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(project.into()))
}
