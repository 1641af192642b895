use axum::{extract::State, response::IntoResponse, Json};
use editor_core::error::AppError;
use serde_json::json;

use crate::services::metrics::get_metrics;
use crate::startup::AppState;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "editor-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: the store and the inference backend must both answer.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.gateway.health_check().await?;
    state
        .provider
        .health_check()
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({ "status": "ready" })))
}

pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}
