//! Read-only view endpoints: branches, summary and silo colours.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use super::not_found;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/branches", get(list_branches))
        .route("/api/branches/{id}", get(get_branch))
        .route("/api/summary", get(get_summary))
        .route("/api/colors", delete(reset_colors))
        .route("/api/colors/{name}", get(get_color))
}

async fn list_branches(State(state): State<AppState>) -> Response {
    // ---
    let dash = state.dashboard.lock().await;
    debug!("GET /api/branches - {} branches", dash.branches().len());
    Json(dash.branches()).into_response()
}

async fn get_branch(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    // ---
    let dash = state.dashboard.lock().await;
    match dash.branch(&id) {
        Some(branch) => Json(branch).into_response(),
        None => not_found(format!("Unknown branch: {}", id)),
    }
}

async fn get_summary(State(state): State<AppState>) -> Response {
    let dash = state.dashboard.lock().await;
    Json(dash.summary()).into_response()
}

#[derive(Serialize)]
struct ColorResponse {
    name: String,
    color: &'static str,
}

async fn get_color(Path(name): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let color = state.dashboard.lock().await.color_for(&name);
    Json(ColorResponse { name, color })
}

/// Forget every colour assignment; the next lookups restart the palette.
async fn reset_colors(State(state): State<AppState>) -> StatusCode {
    state.dashboard.lock().await.reset_colors();
    debug!("Silo colour cache reset");
    StatusCode::NO_CONTENT
}
