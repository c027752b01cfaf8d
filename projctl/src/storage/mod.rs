//! File storage for project attachments.
//!
//! Uploaded payloads are written under a per-category directory (`pdfs/` for pitch decks,
//! `images/` for images) with a freshly generated name, see [`naming`]. The [`FileStorage`]
//! trait is the seam the ingestion pipeline talks to; [`LocalFileStorage`] is the
//! filesystem implementation used by the service, tests swap in instrumented ones.

pub mod local;
pub mod naming;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;

pub use local::LocalFileStorage;

/// The kind of attachment, which decides the allow-list and the storage directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    PitchDeck,
    Image,
}

impl FileCategory {
    /// Directory (relative to the storage root) holding files of this category
    pub fn dir_name(&self) -> &'static str {
        match self {
            FileCategory::PitchDeck => "pdfs",
            FileCategory::Image => "images",
        }
    }

    /// Short label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::PitchDeck => "pdf",
            FileCategory::Image => "images",
        }
    }

    /// Lower-case extensions (without the dot) accepted for this category
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            FileCategory::PitchDeck => &["pdf"],
            FileCategory::Image => &["jpg", "jpeg", "png", "svg"],
        }
    }

    /// Whether `filename` carries an extension on this category's allow-list (case-insensitive)
    pub fn accepts(&self, filename: &str) -> bool {
        extension_of(filename)
            .map(|ext| self.allowed_extensions().iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
            .unwrap_or(false)
    }

    /// Find the category a stored file belongs to from its extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        [FileCategory::PitchDeck, FileCategory::Image]
            .into_iter()
            .find(|category| category.allowed_extensions().iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Extension of the final path component, without the dot
pub fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}

/// A file that has been written to storage under a generated name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SavedFile {
    pub category: FileCategory,
    pub name: String,
}

impl SavedFile {
    pub fn new(category: FileCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }

    /// Path relative to the storage root, e.g. `pdfs/<uuid>.pdf`
    pub fn relative_path(&self) -> PathBuf {
        Path::new(self.category.dir_name()).join(&self.name)
    }
}

impl fmt::Display for SavedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file {0} not found")]
    NotFound(String),

    #[error("unsupported file extension {0:?}")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Byte stream over a stored file
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Trait for attachment storage backends
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `content` under a freshly generated name derived from `original_name`
    async fn store(&self, category: FileCategory, original_name: &str, content: Bytes) -> Result<SavedFile>;

    /// Remove a stored file. A file that is already gone is reported as [`StorageError::NotFound`].
    async fn delete(&self, file: &SavedFile) -> Result<()>;

    /// Open a stored file for streaming
    async fn open(&self, file: &SavedFile) -> Result<FileReader>;
}

/// Create the storage backend for the configured root directory
pub async fn create_file_storage(config: &crate::config::StorageConfig) -> anyhow::Result<Arc<dyn FileStorage>> {
    tracing::info!("Creating local file storage backend (path: {:?})", config.path);
    tokio::fs::create_dir_all(&config.path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create storage directory {:?}: {}", config.path, e))?;
    Ok(Arc::new(LocalFileStorage::new(config.path.clone())))
}
