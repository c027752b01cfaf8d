//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `SqliteConnection` and returns models from
//! [`crate::db::models`]. Passing a transaction instead of a pooled connection makes
//! every call part of that transaction:
//!
//! ```ignore
//! use projctl::db::handlers::{Projects, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let project = Projects::new(&mut tx).create(&request).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! - [`Projects`]: projects with their pitch decks, images and team members
//! - [`TeamMembers`]: team members of a project

pub mod projects;
pub mod repository;
pub mod team_members;

pub use projects::Projects;
pub use repository::Repository;
pub use team_members::TeamMembers;
