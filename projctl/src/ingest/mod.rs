//! Concurrent ingestion of project attachments with compensating cleanup.
//!
//! A project is created from a batch of uploaded files plus a database row. Filesystem
//! writes and the database transaction cannot be committed atomically, so this module
//! makes the pair behave as one unit by undoing whatever was written when a later step
//! fails:
//!
//! ```text
//!   UploadTask*  ──▶ UploadOrchestrator::process_uploads ──▶ SavedFiles
//!                        │ (≤ K concurrent saves)                │
//!                        │ any failure                           ▼
//!                        └──▶ compensate(saved) ◀── failure ── ProjectCreator (db tx)
//! ```
//!
//! - [`orchestrator`]: bounded fan-out of saves and of compensating deletions
//! - [`coordinator`]: sequences the upload batch and the database transaction
//!
//! A process crash between a successful batch and the commit leaves the written files
//! behind; nothing here is durable across restarts.

pub mod coordinator;
pub mod orchestrator;

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use crate::storage::{FileCategory, SavedFile, StorageError};

pub use coordinator::{CreationError, ProjectCreator};
pub use orchestrator::UploadOrchestrator;

/// One uploaded file waiting to be saved
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub category: FileCategory,
    pub original_name: String,
    pub content: Bytes,
}

impl UploadTask {
    pub fn new(category: FileCategory, original_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            category,
            original_name: original_name.into(),
            content: content.into(),
        }
    }

    pub fn pitch_deck(original_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::new(FileCategory::PitchDeck, original_name, content)
    }

    pub fn image(original_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::new(FileCategory::Image, original_name, content)
    }
}

/// Why a single upload in a batch did not produce a saved file
#[derive(Debug, Error)]
pub enum UploadFailure {
    #[error("invalid file type for {category}: {filename}")]
    InvalidType { category: FileCategory, filename: String },

    #[error("error saving {category} file {filename}: {source}")]
    Write {
        category: FileCategory,
        filename: String,
        source: StorageError,
    },

    /// The save task itself did not run to completion
    #[error("upload task failed for {filename}: {reason}")]
    Task { filename: String, reason: String },
}

/// A saved file that compensation could not remove
#[derive(Debug, Error)]
#[error("deleting file {file}: {source}")]
pub struct DeletionFailure {
    pub file: SavedFile,
    pub source: StorageError,
}

/// Aggregate outcome of a failed upload batch.
///
/// By the time this is returned every file the batch managed to save has been handed to
/// compensation; `compensation_failures` lists the ones that are still on disk.
#[derive(Debug)]
pub struct UploadBatchError {
    pub failures: Vec<UploadFailure>,
    pub compensation_failures: Vec<DeletionFailure>,
}

impl UploadBatchError {
    /// Every failure is a disallowed extension and nothing leaked, so the client is at fault
    pub fn is_validation_only(&self) -> bool {
        !self.failures.is_empty()
            && self.compensation_failures.is_empty()
            && self.failures.iter().all(|f| matches!(f, UploadFailure::InvalidType { .. }))
    }
}

impl fmt::Display for UploadBatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errors occurred while saving files: {}", join_messages(&self.failures))?;
        if !self.compensation_failures.is_empty() {
            write!(f, "; errors occurred while deleting files: {}", join_messages(&self.compensation_failures))?;
        }
        Ok(())
    }
}

impl std::error::Error for UploadBatchError {}

/// Storage names of a fully successful batch, split by category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedFiles {
    pub pitch_decks: Vec<String>,
    pub images: Vec<String>,
}

impl SavedFiles {
    pub fn push(&mut self, file: SavedFile) {
        match file.category {
            FileCategory::PitchDeck => self.pitch_decks.push(file.name),
            FileCategory::Image => self.images.push(file.name),
        }
    }

    pub fn len(&self) -> usize {
        self.pitch_decks.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitch_decks.is_empty() && self.images.is_empty()
    }

    /// The batch as storage handles, e.g. for compensation
    pub fn to_saved_files(&self) -> Vec<SavedFile> {
        self.pitch_decks
            .iter()
            .map(|name| SavedFile::new(FileCategory::PitchDeck, name.clone()))
            .chain(self.images.iter().map(|name| SavedFile::new(FileCategory::Image, name.clone())))
            .collect()
    }
}

pub(crate) fn join_messages<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
