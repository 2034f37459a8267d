use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppError,
    selection::{self, SelectionQuery},
    state::AppState,
};

/// `GET /widget/{widget_id}` — the selection endpoint consumed by the embed
/// runtime.
///
/// ## Query parameters
/// `limit`, `ctx_path`, `ctx_device`, `utm_source`, `utm_medium`,
/// `utm_campaign`, `utm_term`, `utm_content` — all optional. `Referer`/
/// `Origin` headers feed the advisory domain check.
///
/// ## Responses
/// - 200 with `{widget, notifications[], meta}`
/// - 400 `invalid_widget_id` when the path segment is not a UUID
/// - 404 when no widget record exists
/// - 500 `internal_error` otherwise
///
/// The response carries a short public `Cache-Control` so a CDN in front of
/// the endpoint can absorb bursts; correctness does not depend on it.
#[tracing::instrument(skip(state, query, headers))]
pub async fn select(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<String>,
    Query(query): Query<SelectionQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let payload = selection::select_notifications(&state, &widget_id, &query, &headers).await?;
    let cache_control = format!(
        "public, max-age={}",
        state.config.selection_cache_max_age_secs
    );
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(payload)))
}
