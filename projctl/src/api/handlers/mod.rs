//! HTTP request handlers, one module per resource.
//!
//! Handlers validate input, call into [`crate::db::handlers`] repositories or the
//! [`crate::ingest`] pipeline, and convert results into API models. Failures are returned as
//! [`crate::errors::Error`], which renders the status code and message.
//!
//! - [`projects`]: project creation (multipart), listing and lookup
//! - [`files`]: stored attachment retrieval
//! - [`team_members`]: team member creation, listing and role updates

pub mod files;
pub mod projects;
pub mod team_members;
