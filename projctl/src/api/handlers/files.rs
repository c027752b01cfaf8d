use axum::{
    body::Body,
    extract::{Path, State},
    http::{Response, header},
};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::{
    AppState,
    errors::{Error, Result},
    storage::{FileCategory, SavedFile, StorageError, extension_of, naming::is_generated_name},
};

/// Strip any directory part, so only names directly inside a category directory resolve
fn base_name(requested: &str) -> &str {
    requested.rsplit(['/', '\\']).next().unwrap_or(requested)
}

#[utoipa::path(
    get,
    path = "/projects/file/{filename}",
    tag = "files",
    summary = "Retrieve project file",
    description = "Stream a stored pitch deck or image. The directory is chosen from the file extension. Only generated storage names resolve.",
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown extension or file not found")
    ),
    params(
        ("filename" = String, Path, description = "Storage name returned in a project's `pitch_decks` or `images`")
    )
)]
#[instrument(skip(state), err)]
pub async fn retrieve_file(State(state): State<AppState>, Path(filename): Path<String>) -> Result<Response<Body>> {
    let name = base_name(&filename);
    if !is_generated_name(name) {
        return Err(Error::Storage(StorageError::NotFound(name.to_string())));
    }

    let category = extension_of(name)
        .and_then(FileCategory::from_extension)
        .ok_or_else(|| Error::Storage(StorageError::UnsupportedExtension(name.to_string())))?;
    let file = SavedFile::new(category, name);

    let reader = state.storage.open(&file).await?;
    let mime = mime_guess::from_path(name).first_or_octet_stream();

    tracing::debug!(file = %file, content_type = %mime, "Streaming stored file");

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", name))
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| Error::Other(e.into()))
}
