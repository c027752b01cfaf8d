//! Database record models.
//!
//! Request structs (`*CreateDBRequest`) carry what a repository needs to insert a row;
//! response structs (`*DBResponse`) carry what it reads back. They are kept separate from
//! the API models in [`crate::api::models`] so storage and wire shapes can evolve
//! independently; conversions live next to the API models.
//!
//! - [`projects`]: project rows joined with pitch decks, images and team members
//! - [`team_members`]: team member rows

pub mod projects;
pub mod team_members;
