//! Local filesystem storage backend.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use super::naming::generate_unique_filename;
use super::{FileCategory, FileReader, FileStorage, Result, SavedFile, StorageError};

/// Stores files in `<base_path>/<category dir>/<generated name>`
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn full_path(&self, file: &SavedFile) -> PathBuf {
        self.base_path.join(file.relative_path())
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[instrument(skip(self, content), fields(category = %category, size = content.len()), err)]
    async fn store(&self, category: FileCategory, original_name: &str, content: Bytes) -> Result<SavedFile> {
        let dir = self.base_path.join(category.dir_name());
        fs::create_dir_all(&dir).await?;

        let saved = SavedFile::new(category, generate_unique_filename(original_name));
        let full_path = self.full_path(&saved);

        // create_new: never clobber an existing file even if a name were reused
        let mut file = fs::OpenOptions::new().write(true).create_new(true).open(&full_path).await?;

        let written = async {
            file.write_all(&content).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&full_path).await {
                tracing::warn!("Failed to remove partially written file {}: {}", full_path.display(), cleanup);
            }
            return Err(e.into());
        }

        tracing::debug!("Saved {} file {} as {}", category, original_name, saved.name);
        Ok(saved)
    }

    #[instrument(skip(self, file), fields(path = %file), err)]
    async fn delete(&self, file: &SavedFile) -> Result<()> {
        match fs::remove_file(self.full_path(file)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(file.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, file: &SavedFile) -> Result<FileReader> {
        match fs::File::open(self.full_path(file)).await {
            Ok(handle) => Ok(Box::new(handle)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(file.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
