//! Test utilities: app construction and instrumented storage backends.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use sqlx::SqlitePool;

use crate::config::{Config, StorageConfig};
use crate::storage::{FileCategory, FileReader, FileStorage, LocalFileStorage, Result, SavedFile, StorageError};

pub fn create_test_config(storage_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig {
            path: storage_dir.to_path_buf(),
        },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

pub async fn create_test_app(pool: SqlitePool, storage_dir: &Path) -> TestServer {
    let app = crate::Application::new_with_pool(create_test_config(storage_dir), Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// Number of files stored under the category directories of `root`
pub fn stored_file_count(root: &Path) -> usize {
    [FileCategory::PitchDeck, FileCategory::Image]
        .iter()
        .map(|category| match std::fs::read_dir(root.join(category.dir_name())) {
            Ok(entries) => entries.filter_map(|entry| entry.ok()).filter(|entry| entry.path().is_file()).count(),
            Err(_) => 0,
        })
        .sum()
}

/// Local storage that records how many store/delete calls overlap.
///
/// Every call holds its slot for a short sleep so that unbounded fan-out would be visible.
pub struct CountingStorage {
    inner: LocalFileStorage,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingStorage {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalFileStorage::new(root.to_path_buf()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    async fn tracked<T>(&self, op: impl std::future::Future<Output = T>) -> T {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = op.await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl FileStorage for CountingStorage {
    async fn store(&self, category: FileCategory, original_name: &str, content: Bytes) -> Result<SavedFile> {
        self.tracked(self.inner.store(category, original_name, content)).await
    }

    async fn delete(&self, file: &SavedFile) -> Result<()> {
        self.tracked(self.inner.delete(file)).await
    }

    async fn open(&self, file: &SavedFile) -> Result<FileReader> {
        self.inner.open(file).await
    }
}

/// Local storage that fails writes or deletes for chosen original filenames
pub struct FaultyStorage {
    inner: LocalFileStorage,
    fail_store: HashSet<String>,
    fail_delete: HashSet<String>,
    /// Generated storage name -> original upload name
    originals: Mutex<HashMap<String, String>>,
    deleted: Mutex<Vec<SavedFile>>,
}

impl FaultyStorage {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalFileStorage::new(PathBuf::from(root)),
            fail_store: HashSet::new(),
            fail_delete: HashSet::new(),
            originals: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Fail the write of any upload named `original_name`
    pub fn fail_store_for(mut self, original_name: &str) -> Self {
        self.fail_store.insert(original_name.to_string());
        self
    }

    /// Fail the deletion of the file saved for an upload named `original_name`
    pub fn fail_delete_for(mut self, original_name: &str) -> Self {
        self.fail_delete.insert(original_name.to_string());
        self
    }

    /// Files deleted successfully so far
    pub fn deleted(&self) -> Vec<SavedFile> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStorage for FaultyStorage {
    async fn store(&self, category: FileCategory, original_name: &str, content: Bytes) -> Result<SavedFile> {
        if self.fail_store.contains(original_name) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }

        let saved = self.inner.store(category, original_name, content).await?;
        self.originals.lock().unwrap().insert(saved.name.clone(), original_name.to_string());
        Ok(saved)
    }

    async fn delete(&self, file: &SavedFile) -> Result<()> {
        let original = self.originals.lock().unwrap().get(&file.name).cloned();
        if original.is_some_and(|name| self.fail_delete.contains(&name)) {
            return Err(StorageError::Io(std::io::Error::other("permission denied")));
        }

        self.inner.delete(file).await?;
        self.deleted.lock().unwrap().push(file.clone());
        Ok(())
    }

    async fn open(&self, file: &SavedFile) -> Result<FileReader> {
        self.inner.open(file).await
    }
}
