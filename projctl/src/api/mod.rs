//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! All routes are nested under `/api/v1`:
//!
//! - **Projects** (`/projects`, `/projects/{id}`): creation with attachments, listing, lookup
//! - **Files** (`/projects/file/{filename}`): streaming of stored pitch decks and images
//! - **Team members** (`/projects/{project_id}/team-members`, `/team-members/{member_id}/role`)
//!
//! # OpenAPI Documentation
//!
//! Every handler carries a `utoipa` annotation. The document is served at
//! `/api-docs/openapi.json` and browsable at `/docs`.

pub mod handlers;
pub mod models;
