use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use editor_core::error::AppError;
use metrics::counter;

use crate::dtos::{DocumentResponse, UploadResponse};
use crate::startup::AppState;
use crate::upload::title_from_file_name;

/// Convert an uploaded PDF or DOCX into a new document. The original
/// file is archived in blob storage; the converted markup becomes the
/// document content and the file name stem becomes the title.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    let original_name = field.file_name().unwrap_or("unnamed").to_string();
    let mime_type = field.content_type().unwrap_or_default().to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?;

    let processed = match state.uploads.process(&original_name, &mime_type, &data).await {
        Ok(processed) => {
            counter!("uploads_total", "outcome" => "success").increment(1);
            processed
        }
        Err(e) => {
            counter!("uploads_total", "outcome" => "failure").increment(1);
            return Err(e.into());
        }
    };

    // The converted file becomes a fresh document in the workspace.
    state.documents.set_current(None);
    let document = state
        .documents
        .save(&title_from_file_name(&original_name), &processed.content)
        .await?;
    state.assistant.set_document(Some(document.id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            document: DocumentResponse::from(document),
            metadata: processed.metadata,
        }),
    ))
}
