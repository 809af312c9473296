use super::{ApiError, AppState};
use crate::media::MediaService;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

pub(crate) async fn download(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let service = MediaService::new(state.config.paths.clone());
    let Some(path) = service.resolve(&file) else {
        return Err(ApiError::NotFound(format!("media {file} not found")));
    };

    let data = tokio::fs::read(&path)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    let mime = infer::get(&data)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, mime)], data).into_response())
}
