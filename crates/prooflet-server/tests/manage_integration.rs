use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use prooflet_core::config::Config;
use prooflet_duckdb::DuckDbBackend;
use prooflet_server::app::build_app;
use prooflet_server::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/prooflet-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        default_selection_limit: 15,
        max_selection_limit: 50,
        rate_limit_max_events: 120,
        rate_limit_window_secs: 60,
        selection_cache_max_age_secs: 30,
    }
}

async fn setup() -> axum::Router {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    build_app(state)
}

fn request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    match body {
        Some(value) => builder.body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

async fn create_widget(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/widgets",
            Some(&json!({
                "account_id": "acct_1",
                "name": "Homepage widget",
                "domain": "example.com",
                "duration": 8
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["data"]["id"]
        .as_str()
        .expect("widget id in response")
        .to_string()
}

async fn create_notification(app: &axum::Router, widget_id: &str, body: &Value) -> Value {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/widgets/{widget_id}/notifications"),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn widget_create_fetch_update_delete() {
    let app = setup().await;
    let widget_id = create_widget(&app).await;
    assert!(uuid::Uuid::parse_str(&widget_id).is_ok());

    let fetched = app
        .clone()
        .oneshot(request("GET", &format!("/api/widgets/{widget_id}"), None))
        .await
        .expect("response");
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched_body = json_body(fetched).await;
    assert_eq!(fetched_body["data"]["name"], "Homepage widget");
    assert_eq!(fetched_body["data"]["duration_seconds"], 8);

    let updated = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/widgets/{widget_id}"),
            Some(&json!({ "name": "Checkout widget", "loop": false })),
        ))
        .await
        .expect("response");
    assert_eq!(updated.status(), StatusCode::OK);
    let updated_body = json_body(updated).await;
    assert_eq!(updated_body["data"]["name"], "Checkout widget");
    assert_eq!(updated_body["data"]["loop_enabled"], false);
    assert_eq!(
        updated_body["data"]["duration_seconds"], 8,
        "untouched fields survive a partial update"
    );

    let deleted = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/widgets/{widget_id}"), None))
        .await
        .expect("response");
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app
        .oneshot(request("GET", &format!("/api/widgets/{widget_id}"), None))
        .await
        .expect("response");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nonpositive_timing_values_are_rejected() {
    let app = setup().await;
    let response = app
        .oneshot(request(
            "POST",
            "/api/widgets",
            Some(&json!({
                "account_id": "acct_1",
                "name": "Bad widget",
                "duration": 0
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("duration"));
}

#[tokio::test]
async fn unknown_notification_type_is_rejected_with_the_accepted_list() {
    let app = setup().await;
    let widget_id = create_widget(&app).await;
    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/widgets/{widget_id}/notifications"),
            Some(&json!({ "type": "flash_sale", "message": "hi" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("purchase"));
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let app = setup().await;
    let widget_id = create_widget(&app).await;
    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/widgets/{widget_id}/notifications"),
            Some(&json!({ "type": "review", "rating": 9 })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_clones_fields_with_fresh_identity() {
    let app = setup().await;
    let widget_id = create_widget(&app).await;
    let created = create_notification(
        &app,
        &widget_id,
        &json!({
            "type": "purchase",
            "name": "Ada",
            "message": "bought the plan",
            "target_devices": ["mobile"]
        }),
    )
    .await;
    let source_id = created["data"]["id"].as_str().expect("id");

    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/notifications/{source_id}/duplicate"),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let clone = json_body(response).await;
    assert_ne!(clone["data"]["id"], created["data"]["id"]);
    assert_eq!(clone["data"]["name"], "Ada");
    assert_eq!(clone["data"]["target_devices"], json!(["mobile"]));
}

#[tokio::test]
async fn deactivated_notification_disappears_from_selection() {
    let app = setup().await;
    let widget_id = create_widget(&app).await;
    let created = create_notification(
        &app,
        &widget_id,
        &json!({ "type": "purchase", "name": "Ada", "message": "bought" }),
    )
    .await;
    let notification_id = created["data"]["id"].as_str().expect("id");

    let toggled = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/notifications/{notification_id}"),
            Some(&json!({ "is_active": false })),
        ))
        .await
        .expect("response");
    assert_eq!(toggled.status(), StatusCode::OK);

    let selection = app
        .oneshot(request("GET", &format!("/widget/{widget_id}"), None))
        .await
        .expect("response");
    let body = json_body(selection).await;
    assert_eq!(body["notifications"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn widget_delete_cascades_to_selection() {
    let app = setup().await;
    let widget_id = create_widget(&app).await;
    create_notification(
        &app,
        &widget_id,
        &json!({ "type": "purchase", "name": "Ada", "message": "bought" }),
    )
    .await;

    let deleted = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/widgets/{widget_id}"), None))
        .await
        .expect("response");
    assert_eq!(deleted.status(), StatusCode::OK);

    let selection = app
        .oneshot(request("GET", &format!("/widget/{widget_id}"), None))
        .await
        .expect("response");
    assert_eq!(selection.status(), StatusCode::NOT_FOUND);
}
