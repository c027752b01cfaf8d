//! Common type definitions.
//!
//! Entity IDs are SQLite rowids wrapped in type aliases so signatures say what they carry:
//!
//! - [`ProjectId`]: project identifier
//! - [`TeamMemberId`]: team member identifier

pub type ProjectId = i64;
pub type TeamMemberId = i64;
