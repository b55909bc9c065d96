use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{self, FileUploadAgent};
use crate::models::{AppState, UploadResponse};
use crate::types::{AppError, AppResult};

const FILE_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/{session_id}/document", post(upload_document))
        .with_state(state)
}

struct PdfUpload {
    filename: Option<String>,
    data: Bytes,
}

async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let session = state.sessions.require(&session_id).await?;
    let upload = read_pdf_field(multipart, state.config.server.max_upload_bytes).await?;
    info!(
        %session_id,
        filename = upload.filename.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.data.len(),
        "File upload request received"
    );

    session.lock().await.begin_upload()?;

    let task_session = Arc::clone(&session);
    let task = tokio::spawn(async move {
        let result = agents::extract(upload.data).await;
        let (pages, characters) = match &result {
            Ok(text) => (Some(text.page_count()), Some(text.char_count())),
            Err(_) => (None, None),
        };
        let document_loaded = matches!(&result, Ok(text) if !text.is_empty());

        let mut guard = task_session.lock().await;
        guard.finish_upload(result);
        UploadResponse {
            document_loaded,
            filename: upload.filename,
            pages,
            characters,
            messages: guard.messages().to_vec(),
        }
    });

    match task.await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            session.lock().await.abandon();
            Err(AppError::Internal(format!("extraction task failed: {}", e)))
        }
    }
}

async fn read_pdf_field(mut multipart: Multipart, limit: usize) -> AppResult<PdfUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        if !FileUploadAgent::looks_like_pdf(filename.as_deref(), content_type.as_deref()) {
            warn!(?filename, ?content_type, "Rejected non-PDF upload");
            return Err(AppError::InvalidRequest(
                "only PDF documents can be uploaded".to_string(),
            ));
        }

        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        return Ok(PdfUpload { filename, data });
    }

    Err(AppError::InvalidRequest(format!(
        "multipart field '{}' is missing",
        FILE_FIELD
    )))
}

fn multipart_error(error: MultipartError, limit: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(limit)
    } else {
        AppError::InvalidRequest(error.body_text())
    }
}
