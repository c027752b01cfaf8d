//! OpenAPI document for the `/api/v1` surface, served at `/api-docs/openapi.json` and rendered by
//! Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api::{
    handlers::{files, projects, team_members},
    models::{
        pagination::Pagination,
        projects::{LookingFor, ProjectCreateForm, ProjectResponse},
        team_members::{TeamMemberCreate, TeamMemberResponse, TeamMemberRoleUpdate},
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "projctl",
        description = "Project records with pitch decks, images and team members."
    ),
    servers((url = "/api/v1", description = "Project API")),
    paths(
        projects::create_project,
        projects::list_projects,
        projects::get_project,
        files::retrieve_file,
        team_members::add_team_member,
        team_members::list_team_members,
        team_members::update_team_member_role,
    ),
    components(schemas(
        LookingFor,
        Pagination,
        ProjectCreateForm,
        ProjectResponse,
        TeamMemberCreate,
        TeamMemberResponse,
        TeamMemberRoleUpdate,
    )),
    tags(
        (name = "projects", description = "Project creation and lookup"),
        (name = "files", description = "Stored pitch decks and images"),
        (name = "team_members", description = "Team members of a project"),
    )
)]
pub struct ApiDoc;
