//! Bounded fan-out of attachment saves and compensating deletions.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::instrument;

use super::{DeletionFailure, SavedFiles, UploadBatchError, UploadFailure, UploadTask};
use crate::storage::{FileStorage, SavedFile, StorageError};

/// Saves upload batches with at most `max_concurrency` storage operations in flight.
///
/// Every launched operation is awaited before a batch is judged; nothing is cancelled early,
/// so a failing sibling never leaves a truncated file behind.
#[derive(Clone)]
pub struct UploadOrchestrator {
    storage: Arc<dyn FileStorage>,
    max_concurrency: usize,
}

impl UploadOrchestrator {
    pub fn new(storage: Arc<dyn FileStorage>, max_concurrency: usize) -> Self {
        Self {
            storage,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Save every pitch deck and image of a batch.
    ///
    /// On success all storage names are returned split by category (completion order). If
    /// any file is rejected or fails to write, every file the batch did save is deleted
    /// before the aggregated error is returned.
    #[instrument(skip_all, fields(pitch_decks = pitch_decks.len(), images = images.len()), err)]
    pub async fn process_uploads(&self, pitch_decks: Vec<UploadTask>, images: Vec<UploadTask>) -> Result<SavedFiles, UploadBatchError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set: JoinSet<Result<SavedFile, UploadFailure>> = JoinSet::new();
        let mut names = HashMap::new();
        let mut failures = Vec::new();

        for task in pitch_decks.into_iter().chain(images) {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    failures.push(UploadFailure::Task {
                        filename: task.original_name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let storage = self.storage.clone();
            let filename = task.original_name.clone();
            let handle = join_set.spawn(async move {
                let _permit = permit;
                save_one(storage.as_ref(), task).await
            });
            names.insert(handle.id(), filename);
        }

        let mut saved = Vec::new();
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, Ok(file))) => saved.push(file),
                Ok((_, Err(failure))) => failures.push(failure),
                Err(e) => failures.push(UploadFailure::Task {
                    filename: names.remove(&e.id()).unwrap_or_default(),
                    reason: e.to_string(),
                }),
            }
        }

        if failures.is_empty() {
            counter!("projctl_upload_batches_total", "outcome" => "success").increment(1);
            let mut result = SavedFiles::default();
            for file in saved {
                counter!("projctl_files_saved_total", "category" => file.category.dir_name()).increment(1);
                result.push(file);
            }
            return Ok(result);
        }

        counter!("projctl_upload_batches_total", "outcome" => "failure").increment(1);
        tracing::warn!(
            failed = failures.len(),
            saved = saved.len(),
            "Upload batch failed, removing files saved by this batch"
        );

        let compensation_failures = self.compensate(&saved).await;
        Err(UploadBatchError {
            failures,
            compensation_failures,
        })
    }

    /// Delete `files` with the same concurrency bound, attempting every one of them.
    ///
    /// Returns one entry per file that is still present (or whose state is unknown).
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn compensate(&self, files: &[SavedFile]) -> Vec<DeletionFailure> {
        if files.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set: JoinSet<Result<(), DeletionFailure>> = JoinSet::new();
        let mut pending = HashMap::new();
        let mut deletion_failures = Vec::new();

        for file in files.iter().cloned() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    deletion_failures.push(DeletionFailure {
                        file,
                        source: StorageError::Io(std::io::Error::other(e)),
                    });
                    continue;
                }
            };

            let storage = self.storage.clone();
            let tracked = file.clone();
            let handle = join_set.spawn(async move {
                let _permit = permit;
                storage.delete(&file).await.map_err(|source| DeletionFailure { file, source })
            });
            pending.insert(handle.id(), tracked);
        }

        let mut removed = 0u64;
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, Ok(()))) => removed += 1,
                Ok((_, Err(failure))) => deletion_failures.push(failure),
                Err(e) => {
                    if let Some(file) = pending.remove(&e.id()) {
                        deletion_failures.push(DeletionFailure {
                            file,
                            source: StorageError::Io(std::io::Error::other(e)),
                        });
                    }
                }
            }
        }

        counter!("projctl_files_compensated_total").increment(removed);
        if !deletion_failures.is_empty() {
            counter!("projctl_files_leaked_total").increment(deletion_failures.len() as u64);
            for failure in &deletion_failures {
                tracing::error!(file = %failure.file, "Leaked file, compensation could not remove it: {}", failure.source);
            }
        } else {
            tracing::debug!(removed, "Compensation removed every file");
        }

        deletion_failures
    }
}

async fn save_one(storage: &dyn FileStorage, task: UploadTask) -> Result<SavedFile, UploadFailure> {
    let UploadTask {
        category,
        original_name,
        content,
    } = task;

    if !category.accepts(&original_name) {
        return Err(UploadFailure::InvalidType {
            category,
            filename: original_name,
        });
    }

    tracing::debug!("Saving {} file: {}", category, original_name);
    match storage.store(category, &original_name, content).await {
        Ok(saved) => {
            tracing::debug!("Saved {} file: {}", category, saved.name);
            Ok(saved)
        }
        Err(source) => Err(UploadFailure::Write {
            category,
            filename: original_name,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileCategory, LocalFileStorage};
    use crate::test_utils::{CountingStorage, FaultyStorage, stored_file_count};

    fn local_orchestrator(dir: &std::path::Path, max_concurrency: usize) -> UploadOrchestrator {
        UploadOrchestrator::new(Arc::new(LocalFileStorage::new(dir.to_path_buf())), max_concurrency)
    }

    #[tokio::test]
    async fn test_valid_batch_saves_every_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = local_orchestrator(temp_dir.path(), 10);

        let saved = orchestrator
            .process_uploads(
                vec![UploadTask::pitch_deck("deck.pdf", "pdf bytes"), UploadTask::pitch_deck("appendix.PDF", "more")],
                vec![UploadTask::image("logo.png", "png bytes")],
            )
            .await
            .unwrap();

        assert_eq!(saved.pitch_decks.len(), 2);
        assert_eq!(saved.images.len(), 1);
        for file in saved.to_saved_files() {
            assert!(temp_dir.path().join(file.relative_path()).is_file(), "{file} should exist");
        }
        assert_eq!(stored_file_count(temp_dir.path()), 3);
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = local_orchestrator(temp_dir.path(), 10);

        let saved = orchestrator.process_uploads(vec![], vec![]).await.unwrap();
        assert!(saved.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_type_removes_saved_siblings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = local_orchestrator(temp_dir.path(), 10);

        let err = orchestrator
            .process_uploads(
                vec![UploadTask::pitch_deck("deck.pdf", "pdf bytes")],
                vec![UploadTask::image("logo.png", "png"), UploadTask::image("virus.exe", "MZ")],
            )
            .await
            .unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert!(matches!(&err.failures[0], UploadFailure::InvalidType { filename, .. } if filename == "virus.exe"));
        assert!(err.compensation_failures.is_empty());
        assert!(err.is_validation_only());
        assert!(err.to_string().contains("invalid file type for images: virus.exe"));
        assert_eq!(stored_file_count(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_pdf_in_images_slot_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = local_orchestrator(temp_dir.path(), 10);

        let err = orchestrator
            .process_uploads(vec![], vec![UploadTask::image("deck.pdf", "pdf bytes")])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "errors occurred while saving files: invalid file type for images: deck.pdf");
    }

    #[tokio::test]
    async fn test_write_failure_removes_saved_siblings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FaultyStorage::new(temp_dir.path()).fail_store_for("broken.png"));
        let orchestrator = UploadOrchestrator::new(storage.clone(), 3);

        let pitch_decks = (0..5).map(|i| UploadTask::pitch_deck(format!("deck-{i}.pdf"), "pdf")).collect();
        let images = vec![UploadTask::image("ok.jpg", "jpg"), UploadTask::image("broken.png", "png")];

        let err = orchestrator.process_uploads(pitch_decks, images).await.unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert!(matches!(&err.failures[0], UploadFailure::Write { filename, .. } if filename == "broken.png"));
        assert!(err.compensation_failures.is_empty());
        assert!(!err.is_validation_only());
        assert_eq!(storage.deleted().len(), 6);
        assert_eq!(stored_file_count(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_deletion_failures_are_reported_with_original_failures() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(
            FaultyStorage::new(temp_dir.path())
                .fail_store_for("broken.pdf")
                .fail_delete_for("sticky.png"),
        );
        let orchestrator = UploadOrchestrator::new(storage.clone(), 2);

        let err = orchestrator
            .process_uploads(
                vec![UploadTask::pitch_deck("broken.pdf", "pdf")],
                vec![UploadTask::image("sticky.png", "png"), UploadTask::image("fine.svg", "<svg/>")],
            )
            .await
            .unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.compensation_failures.len(), 1);
        assert_eq!(err.compensation_failures[0].file.category, FileCategory::Image);

        let message = err.to_string();
        assert!(message.starts_with("errors occurred while saving files: error saving pdf file broken.pdf"));
        assert!(message.contains("; errors occurred while deleting files: deleting file images/"));

        // only the file whose deletion failed is left behind
        assert_eq!(stored_file_count(temp_dir.path()), 1);
    }

    #[tokio::test]
    async fn test_saves_never_exceed_concurrency_bound() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(CountingStorage::new(temp_dir.path()));
        let orchestrator = UploadOrchestrator::new(storage.clone(), 3);

        let pitch_decks = (0..8).map(|i| UploadTask::pitch_deck(format!("deck-{i}.pdf"), "pdf")).collect();
        let images = (0..9).map(|i| UploadTask::image(format!("img-{i}.png"), "png")).collect();

        let saved = orchestrator.process_uploads(pitch_decks, images).await.unwrap();

        assert_eq!(saved.len(), 17);
        assert_eq!(storage.calls(), 17);
        assert!(storage.max_in_flight() <= 3, "observed {} concurrent saves", storage.max_in_flight());
        assert!(storage.max_in_flight() > 1, "saves should overlap");
    }

    #[tokio::test]
    async fn test_compensation_never_exceeds_concurrency_bound() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(CountingStorage::new(temp_dir.path()));
        let orchestrator = UploadOrchestrator::new(storage.clone(), 4);

        let saved = orchestrator
            .process_uploads((0..12).map(|i| UploadTask::pitch_deck(format!("{i}.pdf"), "pdf")).collect(), vec![])
            .await
            .unwrap();
        storage.reset();

        let failures = orchestrator.compensate(&saved.to_saved_files()).await;

        assert!(failures.is_empty());
        assert_eq!(storage.calls(), 12);
        assert!(storage.max_in_flight() <= 4, "observed {} concurrent deletes", storage.max_in_flight());
        assert_eq!(stored_file_count(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_compensate_reports_missing_files_and_keeps_going() {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = local_orchestrator(temp_dir.path(), 2);

        let saved = orchestrator
            .process_uploads(vec![UploadTask::pitch_deck("a.pdf", "a"), UploadTask::pitch_deck("b.pdf", "b")], vec![])
            .await
            .unwrap();
        let mut files = saved.to_saved_files();
        files.insert(1, SavedFile::new(FileCategory::Image, "never-written.png"));

        let failures = orchestrator.compensate(&files).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].file.name, "never-written.png");
        assert!(matches!(failures[0].source, StorageError::NotFound(_)));
        assert_eq!(stored_file_count(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_identical_names_in_one_batch_do_not_collide() {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = local_orchestrator(temp_dir.path(), 10);

        let images = (0..6).map(|i| UploadTask::image("logo.png", format!("content-{i}"))).collect();
        let saved = orchestrator.process_uploads(vec![], images).await.unwrap();

        let unique: std::collections::HashSet<_> = saved.images.iter().collect();
        assert_eq!(unique.len(), 6);
        assert_eq!(stored_file_count(temp_dir.path()), 6);
    }

    #[tokio::test]
    async fn test_zero_concurrency_runs_one_at_a_time() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(CountingStorage::new(temp_dir.path()));
        let orchestrator = UploadOrchestrator::new(storage.clone(), 0);

        let images = (0..3).map(|i| UploadTask::image(format!("img-{i}.png"), "png")).collect();
        let saved = orchestrator.process_uploads(vec![], images).await.unwrap();

        assert_eq!(saved.len(), 3);
        assert_eq!(storage.max_in_flight(), 1);
    }
}
