//! Database layer for data persistence and access.
//!
//! SQLx over SQLite, organised as repositories:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, ingest coordinator)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! - [`handlers`]: repository implementations
//! - [`models`]: request/response records
//! - [`errors`]: [`errors::DbError`] and the constraint categorisation
//!
//! Migrations live in `migrations/` and are embedded through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
