use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — permissive CORS. Both the selection and analytics
///    endpoints are called from third-party pages via the embed script, so
///    browsers need `Access-Control-Allow-Origin: *` and working OPTIONS
///    preflights on every route the embed touches.
///
/// Analytics rate limiting is enforced inside the handler (it needs the
/// pluggable counter from state), not as a layer.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/widget/{widget_id}", get(routes::widget::select))
        .route("/analytics", post(routes::analytics::track))
        .route("/api/widgets", post(routes::manage::create_widget))
        .route(
            "/api/widgets/{widget_id}",
            get(routes::manage::get_widget)
                .patch(routes::manage::update_widget)
                .delete(routes::manage::delete_widget),
        )
        .route(
            "/api/widgets/{widget_id}/notifications",
            post(routes::manage::create_notification),
        )
        .route(
            "/api/notifications/{notification_id}",
            axum::routing::patch(routes::manage::update_notification)
                .delete(routes::manage::delete_notification),
        )
        .route(
            "/api/notifications/{notification_id}/duplicate",
            post(routes::manage::duplicate_notification),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
