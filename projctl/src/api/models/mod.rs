//! API request and response data models.
//!
//! These structures define the public HTTP contract. They are distinct from the database
//! models in [`crate::db::models`] and carry `utoipa` annotations for the OpenAPI document.
//!
//! - [`projects`]: project responses, the `LookingFor` tag and the multipart form description
//! - [`team_members`]: team member create/update payloads and responses
//! - [`pagination`]: `skip`/`limit` query parameters

pub mod pagination;
pub mod projects;
pub mod team_members;
