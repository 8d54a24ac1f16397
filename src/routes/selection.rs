//! Selection endpoints: active branch and charted silos.
//!
//! Every mutating call answers with the resulting selection so the renderer
//! can redraw without a second round trip.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use super::not_found;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/selection", get(get_selection))
        .route("/api/selection/branch/{id}", post(select_branch))
        .route("/api/selection/silos/{id}/toggle", post(toggle_silo))
        .route("/api/selection/all", post(select_all))
        .route("/api/selection/none", post(deselect_all))
        .route("/api/selection/rows", get(selected_rows))
}

async fn get_selection(State(state): State<AppState>) -> Response {
    let dash = state.dashboard.lock().await;
    Json(dash.selection()).into_response()
}

async fn select_branch(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    // ---
    let mut dash = state.dashboard.lock().await;
    if !dash.select(&id) {
        return not_found(format!("Unknown branch: {}", id));
    }
    info!("Selected branch {}", id);
    Json(dash.selection()).into_response()
}

async fn toggle_silo(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    // ---
    let mut dash = state.dashboard.lock().await;
    if !dash.toggle_silo(&id) {
        return not_found(format!("Silo {} is not in the selected branch", id));
    }
    Json(dash.selection()).into_response()
}

async fn select_all(State(state): State<AppState>) -> Response {
    let mut dash = state.dashboard.lock().await;
    dash.select_all_silos();
    Json(dash.selection()).into_response()
}

async fn deselect_all(State(state): State<AppState>) -> Response {
    let mut dash = state.dashboard.lock().await;
    dash.deselect_all_silos();
    Json(dash.selection()).into_response()
}

async fn selected_rows(State(state): State<AppState>) -> impl IntoResponse {
    let rows = state.dashboard.lock().await.selected_rows();
    Json(rows)
}
