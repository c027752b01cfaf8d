//! Project creation across storage and the database.

use metrics::counter;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use super::{DeletionFailure, UploadBatchError, UploadOrchestrator, UploadTask, join_messages};
use crate::db::{
    errors::{DbError, Result as DbResult},
    handlers::{Projects, Repository},
    models::projects::{ProjectCreateDBRequest, ProjectDBResponse},
};

#[derive(Debug, Error)]
pub enum CreationError {
    /// The upload batch failed; its files were already compensated and the database was not touched
    #[error(transparent)]
    Upload(#[from] UploadBatchError),

    /// The database write failed after the batch was saved
    #[error("project creation error: {source}{}", deletion_suffix(.compensation_failures))]
    Persistence {
        source: DbError,
        compensation_failures: Vec<DeletionFailure>,
    },
}

impl CreationError {
    /// Whether the failure is down to the request content and nothing was left behind
    pub fn is_client_error(&self) -> bool {
        match self {
            CreationError::Upload(e) => e.is_validation_only(),
            CreationError::Persistence {
                source,
                compensation_failures,
            } => source.is_client_error() && compensation_failures.is_empty(),
        }
    }

    /// Whether compensation left files on disk
    pub fn leaked_files(&self) -> bool {
        match self {
            CreationError::Upload(e) => !e.compensation_failures.is_empty(),
            CreationError::Persistence { compensation_failures, .. } => !compensation_failures.is_empty(),
        }
    }
}

fn deletion_suffix(failures: &[DeletionFailure]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!("; file deletion error: {}", join_messages(failures))
    }
}

/// Creates projects so that the stored files and the committed rows always match
#[derive(Clone)]
pub struct ProjectCreator {
    db: SqlitePool,
    orchestrator: UploadOrchestrator,
}

impl ProjectCreator {
    pub fn new(db: SqlitePool, orchestrator: UploadOrchestrator) -> Self {
        Self { db, orchestrator }
    }

    /// Save the attachments, then insert the project with their storage names in one transaction.
    ///
    /// If the transaction fails, the attachments saved for it are deleted before returning.
    #[instrument(skip_all, fields(title = %request.title, pitch_decks = pitch_decks.len(), images = images.len()), err)]
    pub async fn create(
        &self,
        mut request: ProjectCreateDBRequest,
        pitch_decks: Vec<UploadTask>,
        images: Vec<UploadTask>,
    ) -> Result<ProjectDBResponse, CreationError> {
        let saved = self.orchestrator.process_uploads(pitch_decks, images).await?;

        request.pitch_decks = saved.pitch_decks.clone();
        request.images = saved.images.clone();

        match self.persist(&request).await {
            Ok(project) => {
                counter!("projctl_projects_created_total").increment(1);
                tracing::info!(project_id = project.id, files = saved.len(), "Created project");
                Ok(project)
            }
            Err(source) if saved.is_empty() => Err(CreationError::Persistence {
                source,
                compensation_failures: Vec::new(),
            }),
            Err(source) => {
                tracing::warn!(files = saved.len(), "Project insert failed, removing its files: {}", source);
                let compensation_failures = self.orchestrator.compensate(&saved.to_saved_files()).await;
                Err(CreationError::Persistence {
                    source,
                    compensation_failures,
                })
            }
        }
    }

    async fn persist(&self, request: &ProjectCreateDBRequest) -> DbResult<ProjectDBResponse> {
        let mut tx = self.db.begin().await?;

        let created = Projects::new(&mut tx).create(request).await;
        match created {
            Ok(project) => {
                tx.commit().await?;
                Ok(project)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!("Failed to roll back project insert: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::projects::LookingFor;
    use crate::storage::LocalFileStorage;
    use crate::test_utils::{FaultyStorage, stored_file_count};
    use std::sync::Arc;

    fn request(title: &str, project_value: f64) -> ProjectCreateDBRequest {
        ProjectCreateDBRequest {
            title: title.to_string(),
            subtitle: Some("Subtitle".to_string()),
            project_value,
            looking_for: vec![LookingFor::Investment],
            ..Default::default()
        }
    }

    async fn project_rows(pool: &SqlitePool) -> (i64, i64, i64) {
        let projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects").fetch_one(pool).await.unwrap();
        let decks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project_pitch_decks").fetch_one(pool).await.unwrap();
        let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project_images").fetch_one(pool).await.unwrap();
        (projects, decks, images)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_commits_files_and_rows(pool: SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = UploadOrchestrator::new(Arc::new(LocalFileStorage::new(temp_dir.path().to_path_buf())), 10);
        let creator = ProjectCreator::new(pool.clone(), orchestrator);

        let project = creator
            .create(
                request("Rocket", 1500.5),
                vec![UploadTask::pitch_deck("deck.pdf", "pdf")],
                vec![UploadTask::image("logo.png", "png"), UploadTask::image("team.jpg", "jpg")],
            )
            .await
            .unwrap();

        assert!(project.id > 0);
        assert_eq!(project.pitch_decks.len(), 1);
        assert_eq!(project.images.len(), 2);
        assert_eq!(project.looking_for, vec![LookingFor::Investment]);
        for name in &project.pitch_decks {
            assert!(temp_dir.path().join("pdfs").join(name).is_file());
        }
        for name in &project.images {
            assert!(temp_dir.path().join("images").join(name).is_file());
        }
        assert_eq!(project_rows(&pool).await, (1, 1, 2));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_database_failure_removes_every_saved_file(pool: SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = UploadOrchestrator::new(Arc::new(LocalFileStorage::new(temp_dir.path().to_path_buf())), 2);
        let creator = ProjectCreator::new(pool.clone(), orchestrator);

        let pitch_decks = (0..3).map(|i| UploadTask::pitch_deck(format!("deck-{i}.pdf"), "pdf")).collect();
        let images = (0..4).map(|i| UploadTask::image(format!("img-{i}.svg"), "<svg/>")).collect();

        // negative values violate the projects check constraint
        let err = creator.create(request("Broken", -1.0), pitch_decks, images).await.unwrap_err();

        match &err {
            CreationError::Persistence {
                source,
                compensation_failures,
            } => {
                assert!(matches!(source, DbError::CheckViolation { .. }));
                assert!(compensation_failures.is_empty());
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("project creation error: "));
        assert!(!err.to_string().contains("file deletion error"));
        assert_eq!(stored_file_count(temp_dir.path()), 0);
        assert_eq!(project_rows(&pool).await, (0, 0, 0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_blank_title_rolls_back_and_compensates(pool: SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = UploadOrchestrator::new(Arc::new(LocalFileStorage::new(temp_dir.path().to_path_buf())), 10);
        let creator = ProjectCreator::new(pool.clone(), orchestrator);

        let err = creator
            .create(request("   ", 10.0), vec![UploadTask::pitch_deck("deck.pdf", "pdf")], vec![])
            .await
            .unwrap_err();

        assert!(matches!(err, CreationError::Persistence { .. }));
        assert_eq!(stored_file_count(temp_dir.path()), 0);
        assert_eq!(project_rows(&pool).await, (0, 0, 0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_database_failure_without_files_reports_nothing_to_remove(pool: SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FaultyStorage::new(temp_dir.path()));
        let creator = ProjectCreator::new(pool.clone(), UploadOrchestrator::new(storage.clone(), 10));

        let err = creator.create(request("Broken", -1.0), vec![], vec![]).await.unwrap_err();

        assert!(err.is_client_error());
        assert!(!err.leaked_files());
        assert!(storage.deleted().is_empty());
        assert_eq!(project_rows(&pool).await, (0, 0, 0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_compensation_failure_is_reported_with_database_error(pool: SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FaultyStorage::new(temp_dir.path()).fail_delete_for("stuck.pdf"));
        let creator = ProjectCreator::new(pool.clone(), UploadOrchestrator::new(storage, 10));

        let err = creator
            .create(
                request("Broken", -5.0),
                vec![UploadTask::pitch_deck("stuck.pdf", "pdf"), UploadTask::pitch_deck("ok.pdf", "pdf")],
                vec![],
            )
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("project creation error: "));
        assert!(message.contains("; file deletion error: deleting file pdfs/"));
        assert!(!err.is_client_error());
        assert!(err.leaked_files());
        assert_eq!(stored_file_count(temp_dir.path()), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_failure_never_touches_database(pool: SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = UploadOrchestrator::new(Arc::new(LocalFileStorage::new(temp_dir.path().to_path_buf())), 10);
        let creator = ProjectCreator::new(pool.clone(), orchestrator);

        let err = creator
            .create(
                request("Valid", 10.0),
                vec![],
                vec![UploadTask::image("logo.png", "png"), UploadTask::image("setup.exe", "MZ")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CreationError::Upload(_)));
        assert!(err.to_string().contains("setup.exe"));
        assert!(err.is_client_error());
        assert_eq!(stored_file_count(temp_dir.path()), 0);
        assert_eq!(project_rows(&pool).await, (0, 0, 0));
    }
}
