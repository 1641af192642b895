use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use editor_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    AutosaveRequest, CreateDocumentRequest, DocumentListResponse, DocumentResponse,
    UpdateDocumentRequest, WorkspaceParams,
};
use crate::models::UpdateDocument;
use crate::startup::AppState;

pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let documents = state.documents.load_all().await?;
    let total = documents.len();
    Ok(Json(DocumentListResponse {
        documents: documents.into_iter().map(DocumentResponse::from).collect(),
        total,
    }))
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let document = state.documents.save(&request.title, &request.content).await?;
    state.assistant.set_document(Some(document.id)).await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.documents.load(id).await?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updates = UpdateDocument {
        title: request.title,
        content: request.content,
    };
    let document = state.documents.update(id, updates).await?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.documents.delete(id).await?;
    state.assistant.set_document(None).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Debounced content write. Accepted immediately; the store write
/// happens after the quiet period, and a newer edit supersedes it.
pub async fn autosave_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AutosaveRequest>,
) -> Result<impl IntoResponse, AppError> {
    Arc::clone(&state.documents).schedule_autosave(id, request.content);
    Ok(StatusCode::ACCEPTED)
}

/// Resume a workspace from the `id` query parameter. Without the
/// parameter the workspace starts blank.
pub async fn workspace(
    State(state): State<AppState>,
    Query(params): Query<WorkspaceParams>,
) -> Result<impl IntoResponse, AppError> {
    match params.id {
        Some(id) => {
            let document = state.documents.load(id).await?;
            state.assistant.set_document(Some(document.id)).await?;
        }
        None => {
            state.documents.set_current(None);
            state.assistant.set_document(None).await?;
        }
    }
    Ok(Json(state.documents.snapshot()))
}
