use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use editor_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    AskRequest, ClearedResponse, FeedbackRequest, GenerateSuggestionRequest,
    GeneratedTextResponse, ModeRequest, SuggestionListResponse, TextRequest, TranscriptResponse,
};
use crate::models::{AssistantMode, ClearScope};
use crate::startup::AppState;

pub async fn list_suggestions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.assistant.snapshot();
    Ok(Json(SuggestionListResponse {
        suggestions: snapshot.suggestions,
        success_count: snapshot.success_count,
        failure_count: snapshot.failure_count,
    }))
}

pub async fn generate_suggestion(
    State(state): State<AppState>,
    Json(request): Json<GenerateSuggestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    if state.assistant.snapshot().document_id != Some(request.document_id) {
        state
            .assistant
            .set_document(Some(request.document_id))
            .await?;
    }

    let suggestion = state
        .assistant
        .generate(&request.instruction, &request.editor_html)
        .await?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}

pub async fn suggestion_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.assistant.feedback(id, request.feedback).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Switch assistant mode. Entering support attaches (or creates) the
/// document's session and loads its transcript; leaving keeps the
/// transcript but drops the session reference.
pub async fn set_mode(
    State(state): State<AppState>,
    Json(request): Json<ModeRequest>,
) -> Result<impl IntoResponse, AppError> {
    match request.mode {
        AssistantMode::Support => state.assistant.enter_support().await?,
        AssistantMode::Create => state.assistant.leave_support(),
    }

    let snapshot = state.assistant.snapshot();
    Ok(Json(TranscriptResponse {
        session_id: snapshot.active_session,
        messages: snapshot.transcript,
    }))
}

pub async fn get_transcript(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.assistant.snapshot();
    Ok(Json(TranscriptResponse {
        session_id: snapshot.active_session,
        messages: snapshot.transcript,
    }))
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let reply = state.assistant.ask(&request.question).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// Mode-scoped clear. An explicit scope in the body overrides the one
/// implied by the current mode.
pub async fn clear(
    State(state): State<AppState>,
    body: Option<Json<ClearScope>>,
) -> Result<impl IntoResponse, AppError> {
    let scope = match body {
        Some(Json(scope)) => scope,
        None => state.assistant.current_clear_scope()?,
    };
    state.assistant.clear(scope).await?;

    let cleared = match scope {
        ClearScope::Suggestions { .. } => "suggestions",
        ClearScope::Transcript { .. } => "transcript",
    };
    Ok(Json(ClearedResponse { cleared }))
}

pub async fn alternatives(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let content = state.assistant.alternatives(&request.text).await?;
    Ok(Json(GeneratedTextResponse { content }))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let content = state.assistant.analyze(&request.text).await?;
    Ok(Json(GeneratedTextResponse { content }))
}
