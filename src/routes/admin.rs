//! Admin actions and the silo detail history.
//!
//! Create/delete calls are forwarded to the silo API. Each outcome is queued
//! as a toast, and a successful change triggers a refresh so the next read
//! reflects it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::upstream_error;
use crate::dashboard::{DataSource, NotificationLevel};
use crate::demo::demo_history;
use crate::error::FetchError;
use crate::models::{HistoryPoint, NewSilo};
use crate::refresh::refresh_after_change;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/admin/silos", post(create_silo))
        .route("/api/admin/silos/{device_id}", delete(delete_silo))
        .route("/api/admin/branches/{id}", delete(delete_branch))
        .route("/api/silos/{device_id}/history", get(silo_history))
}

async fn create_silo(State(state): State<AppState>, Json(payload): Json<NewSilo>) -> Response {
    // ---
    if let Err(message) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
    }

    info!("POST /api/admin/silos - device {}", payload.device_id);
    let result = state.api.create_silo(&payload).await;
    finish_action(&state, result, "Silo added", StatusCode::CREATED).await
}

async fn delete_silo(Path(device_id): Path<String>, State(state): State<AppState>) -> Response {
    // ---
    info!("DELETE /api/admin/silos/{}", device_id);
    let result = state.api.delete_silo(&device_id).await;
    finish_action(&state, result, "Silo deleted", StatusCode::OK).await
}

async fn delete_branch(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    // ---
    info!("DELETE /api/admin/branches/{}", id);
    let result = state.api.delete_branch(&id).await;
    finish_action(&state, result, "Branch deleted", StatusCode::OK).await
}

/// Queue the toast for an admin call and refresh on success.
async fn finish_action(
    state: &AppState,
    result: Result<(), FetchError>,
    success: &str,
    status: StatusCode,
) -> Response {
    // ---
    match result {
        Ok(()) => {
            state
                .dashboard
                .lock()
                .await
                .notify(NotificationLevel::Success, success, Utc::now());
            let outcome = refresh_after_change(state).await;
            (status, Json(json!({ "message": success, "refresh": outcome }))).into_response()
        }
        Err(e) => {
            error!("Admin action failed: {}", e);
            state
                .dashboard
                .lock()
                .await
                .notify(NotificationLevel::Error, e.user_message(), Utc::now());
            upstream_error(&e)
        }
    }
}

#[derive(Serialize)]
struct HistoryResponse {
    device_id: String,
    source: DataSource,
    points: Vec<HistoryPoint>,
}

async fn silo_history(Path(device_id): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let (source, points) = match state.api.fetch_history(&device_id).await {
        Ok(points) => (DataSource::Live, points),
        Err(e) => {
            warn!("History for {} unavailable, using demo history: {}", device_id, e);
            (DataSource::Demo, demo_history(&device_id, Utc::now()))
        }
    };

    Json(HistoryResponse {
        device_id,
        source,
        points,
    })
}
