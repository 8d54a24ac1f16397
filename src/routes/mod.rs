use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde_json::json;

use crate::error::FetchError;
use crate::AppState;

mod admin;
mod branches;
mod health;
mod selection;
mod status;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(branches::router())
        .merge(selection::router())
        .merge(admin::router())
        .merge(status::router())
        .merge(health::router())
        .with_state(state)
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

/// Upstream failures are reported as 502 with the toast text as the error.
fn upstream_error(err: &FetchError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": err.user_message() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::testing::{app_state, failing_silo_api, fake_silo_api, serve};
    use reqwest::Client;
    use serde_json::Value;

    /// Dashboard served against a fake silo API, already refreshed once.
    async fn spawn_dashboard(upstream: Router) -> String {
        // ---
        let upstream = serve(upstream).await;
        let state = app_state(&upstream);
        crate::refresh::refresh(&state).await;
        serve(router(state)).await
    }

    fn readings() -> Value {
        json!([
            {"device_id": "DEV001", "province": "A", "capacity": 1000, "volume": 200, "silo_no": "1"},
            {"device_id": "DEV002", "province": "A", "capacity": 1000, "volume": 900, "silo_no": "2"},
            {"device_id": "DEV003", "province": "B", "capacity": 500, "volume": 500, "silo_no": "1"},
            {"device_id": "DEV004", "province": "", "capacity": 500, "volume": 10}
        ])
    }

    async fn get_json(client: &Client, url: String) -> (StatusCode, Value) {
        let resp = client.get(url).send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }

    async fn post_json(client: &Client, url: String) -> (StatusCode, Value) {
        let resp = client.post(url).send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn branches_and_summary_endpoints() {
        // ---
        let base = spawn_dashboard(fake_silo_api(readings())).await;
        let client = Client::new();

        let (status, health) = get_json(&client, format!("{}/health", base)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");

        let (_, branches) = get_json(&client, format!("{}/api/branches", base)).await;
        let branches = branches.as_array().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0]["id"], "A");
        assert_eq!(branches[0]["name"], "สาขาA");
        assert_eq!(branches[0]["total_capacity"], 2000.0);
        assert_eq!(branches[0]["total_used"], 1100.0);
        assert_eq!(branches[0]["low_capacity_silos"], 1);
        assert_eq!(branches[0]["silo_count"], 2);
        assert_eq!(branches[1]["low_capacity_silos"], 0);

        let (_, summary) = get_json(&client, format!("{}/api/summary", base)).await;
        assert_eq!(summary["total_branches"], 2);
        assert_eq!(summary["total_silos"], 3);
        assert_eq!(summary["total_capacity"], 2500.0);
        assert_eq!(summary["total_used"], 1600.0);
        assert_eq!(summary["total_low_capacity"], 1);
        let pct = summary["total_usage_percentage"].as_f64().unwrap();
        assert!((pct - 64.0).abs() < 1e-9);

        let (status, branch) = get_json(&client, format!("{}/api/branches/B", base)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(branch["silos"][0]["id"], "DEV003");

        let (status, _) = get_json(&client, format!("{}/api/branches/Z", base)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, status_body) = get_json(&client, format!("{}/api/status", base)).await;
        assert_eq!(status_body["source"], "live");
        assert_eq!(status_body["refreshing"], false);
        assert_eq!(status_body["active_branch"], "A");
    }

    #[tokio::test]
    async fn selection_flow() {
        // ---
        let base = spawn_dashboard(fake_silo_api(readings())).await;
        let client = Client::new();

        let (_, sel) = get_json(&client, format!("{}/api/selection", base)).await;
        assert_eq!(sel["active_branch"], "A");
        assert_eq!(sel["silo_ids"], json!(["DEV001", "DEV002"]));

        let (_, sel) = post_json(&client, format!("{}/api/selection/silos/DEV001/toggle", base)).await;
        assert_eq!(sel["silo_ids"], json!(["DEV002"]));

        let (status, _) =
            post_json(&client, format!("{}/api/selection/silos/DEV003/toggle", base)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, sel) = post_json(&client, format!("{}/api/selection/none", base)).await;
        assert_eq!(sel["silo_ids"], json!([]));
        let (_, sel) = post_json(&client, format!("{}/api/selection/all", base)).await;
        assert_eq!(sel["silo_ids"], json!(["DEV001", "DEV002"]));

        let (_, rows) = get_json(&client, format!("{}/api/selection/rows", base)).await;
        assert_eq!(rows[0]["name"], "ไซโล 1");
        assert_eq!(rows[0]["percent"], 20);
        assert_eq!(rows[0]["color"], "#F97316");
        assert_eq!(rows[1]["color"], "#0EA5E9");

        let (_, sel) = post_json(&client, format!("{}/api/selection/branch/B", base)).await;
        assert_eq!(sel["active_branch"], "B");
        assert_eq!(sel["silo_ids"], json!(["DEV003"]));

        let (status, _) = post_json(&client, format!("{}/api/selection/branch/Z", base)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Same display name as B's silo: same colour.
        let (_, color) = get_json(&client, format!("{}/api/colors/ไซโล 1", base)).await;
        assert_eq!(color["color"], "#F97316");

        let resp = client.delete(format!("{}/api/colors", base)).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 204);
        let (_, color) = get_json(&client, format!("{}/api/colors/ไซโล 2", base)).await;
        assert_eq!(color["color"], "#F97316");
    }

    #[tokio::test]
    async fn admin_actions_queue_notifications() {
        // ---
        let base = spawn_dashboard(fake_silo_api(readings())).await;
        let client = Client::new();

        let payload = json!({
            "device_id": "DEV009", "plant_type": "ข้าวสาร", "province": "A",
            "site_code": "SB009", "silo_no": "9"
        });
        let resp = client
            .post(format!("{}/api/admin/silos", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["refresh"]["outcome"], "completed");

        let mut dup = payload.clone();
        dup["device_id"] = json!("DUP");
        let resp = client
            .post(format!("{}/api/admin/silos", base))
            .json(&dup)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 502);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Device already exists");

        let mut blank = payload.clone();
        blank["province"] = json!(" ");
        let resp = client
            .post(format!("{}/api/admin/silos", base))
            .json(&blank)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        let resp = client
            .delete(format!("{}/api/admin/silos/DEV001", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let resp = client
            .delete(format!("{}/api/admin/branches/A", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let (_, toasts) = get_json(&client, format!("{}/api/notifications", base)).await;
        let levels: Vec<&str> = toasts
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["level"].as_str().unwrap())
            .collect();
        assert_eq!(levels, vec!["success", "error", "success", "success"]);

        let (_, toasts) = get_json(&client, format!("{}/api/notifications", base)).await;
        assert_eq!(toasts, json!([]));
    }

    #[tokio::test]
    async fn admin_change_waits_for_running_refresh() {
        // ---
        let upstream = serve(fake_silo_api(readings())).await;
        let state = app_state(&upstream);
        crate::refresh::refresh(&state).await;
        let before = state.dashboard.lock().await.status().last_refreshed;
        let base = serve(router(state.clone())).await;

        // A poll tick is mid-flight when the admin call lands.
        let held = state.gate.try_begin().unwrap();
        let request = tokio::spawn(async move {
            let payload = json!({
                "device_id": "DEV010", "plant_type": "ข้าวโพด", "province": "B",
                "site_code": "SB010", "silo_no": "2"
            });
            Client::new()
                .post(format!("{}/api/admin/silos", base))
                .json(&payload)
                .send()
                .await
                .unwrap()
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!request.is_finished());
        drop(held);

        let resp = request.await.unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["refresh"], json!({"outcome": "completed", "source": "live"}));

        let after = state.dashboard.lock().await.status().last_refreshed;
        assert!(after > before);
    }

    #[tokio::test]
    async fn history_and_fallbacks_when_upstream_fails() {
        // ---
        let live = spawn_dashboard(fake_silo_api(readings())).await;
        let client = Client::new();
        let (_, history) = get_json(&client, format!("{}/api/silos/DEV001/history", live)).await;
        assert_eq!(history["source"], "live");
        assert_eq!(history["points"].as_array().unwrap().len(), 2);

        let down = spawn_dashboard(failing_silo_api()).await;
        let (_, history) = get_json(&client, format!("{}/api/silos/DEV001/history", down)).await;
        assert_eq!(history["source"], "demo");
        assert_eq!(history["points"].as_array().unwrap().len(), 7);

        let (_, summary) = get_json(&client, format!("{}/api/summary", down)).await;
        assert_eq!(summary["total_silos"], 7);

        let (_, outcome) = post_json(&client, format!("{}/api/refresh", down)).await;
        assert_eq!(outcome, json!({"outcome": "completed", "source": "demo"}));

        let (_, toasts) = get_json(&client, format!("{}/api/notifications", down)).await;
        assert_eq!(toasts.as_array().unwrap().len(), 2);
        assert_eq!(toasts[0]["level"], "error");
    }
}
