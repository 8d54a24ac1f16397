//! Refresh trigger, service status and toast delivery.

use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::Serialize;

use crate::dashboard::{DashboardStatus, Notification};
use crate::refresh::{refresh, RefreshOutcome};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/status", get(status))
        .route("/api/refresh", post(trigger_refresh))
        .route("/api/notifications", get(notifications))
}

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    dashboard: DashboardStatus,
    refreshing: bool,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    // ---
    let dashboard = state.dashboard.lock().await.status();
    Json(StatusResponse {
        dashboard,
        refreshing: state.gate.is_refreshing(),
    })
}

/// Explicit refresh, also used when the browser tab becomes visible again.
async fn trigger_refresh(State(state): State<AppState>) -> Json<RefreshOutcome> {
    Json(refresh(&state).await)
}

async fn notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.dashboard.lock().await.drain_notifications())
}
