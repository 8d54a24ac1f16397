//! Test helpers: throwaway HTTP servers standing in for the silo API.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::dashboard::Dashboard;
use crate::fetcher::SiloApiClient;
use crate::refresh::AppState;

// ---

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn serve(app: Router) -> String {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}

/// Fake inventory API answering `/api/volume_data` with `readings`.
///
/// Admin calls succeed except for device `DUP` (400 with an error body) and
/// deleting device `missing` (404).
pub fn fake_silo_api(readings: Value) -> Router {
    // ---
    Router::new()
        .route(
            "/api/volume_data",
            get(move || {
                let readings = readings.clone();
                async move { Json(readings) }
            }),
        )
        .route(
            "/api/volume_history/{device_id}",
            get(|Path(_device_id): Path<String>| async move {
                Json(json!([
                    {"timestamp": "2025-10-01T00:00:00Z", "volume": 410.0, "volume_percentage": 41},
                    {"timestamp": "2025-10-02T00:00:00", "volume": 420.0}
                ]))
            }),
        )
        .route(
            "/api/admin/silos",
            post(|Json(body): Json<Value>| async move {
                if body["device_id"] == "DUP" {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "Device already exists"})),
                    )
                } else {
                    (StatusCode::CREATED, Json(json!({"message": "created"})))
                }
            }),
        )
        .route(
            "/api/admin/silos/by_device/{device_id}",
            delete(|Path(device_id): Path<String>| async move {
                if device_id == "missing" {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": "Silo not found"})),
                    )
                } else {
                    (StatusCode::OK, Json(json!({"message": "deleted"})))
                }
            }),
        )
        .route(
            "/api/admin/branches/{branch_id}",
            delete(|| async { Json(json!({"message": "deleted"})) }),
        )
}

/// Inventory API that fails every call with a 500.
pub fn failing_silo_api() -> Router {
    // ---
    Router::new()
        .route(
            "/api/volume_data",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/api/volume_history/{device_id}",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
}

/// Application state wired to an upstream at `base`.
pub fn app_state(base: &str) -> AppState {
    let api = SiloApiClient::new(base, std::time::Duration::from_secs(5)).expect("client");
    AppState::new(Dashboard::new(), api)
}
