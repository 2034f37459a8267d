use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use prooflet_core::event::{AnalyticsEvent, AnalyticsEventType, ACCEPTED_EVENT_TYPES};
use prooflet_store::WidgetStore;

use crate::{error::AppError, state::AppState};

/// Wire shape of the tracking call. Every field is optional at the serde
/// layer so presence can be checked by hand — a missing `widget_id` should
/// be a 400 with a usable message, not a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub widget_id: Option<String>,
    pub event_type: Option<String>,
    pub notification_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
}

/// `POST /analytics` — the event sink consumed by the embed runtime.
///
/// ## Validation
/// `widget_id` and a recognised `event_type` are required; everything else
/// is optional. Unknown event types get a 400 listing the accepted enum so
/// embed bugs are diagnosable from the response alone.
///
/// ## Rate limiting
/// Fixed window per source IP (threshold and window from config), checked
/// before any data access. Exceeded ⇒ 429; the embed does not retry.
///
/// ## Response
/// 200 `{"success": true}`. Rows are append-only; nothing reads them back
/// on this path.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TrackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let widget_id = match payload.widget_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(AppError::BadRequest("widget_id is required".to_string())),
    };
    let event_type = payload
        .event_type
        .as_deref()
        .and_then(AnalyticsEventType::parse)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "event_type must be one of: {}",
                ACCEPTED_EVENT_TYPES.join(", ")
            ))
        })?;

    let ip = client_ip(&headers);
    if !state.allow_event(&ip).await {
        return Err(AppError::RateLimited);
    }

    if !state.store.widget_exists(&widget_id).await? {
        return Err(AppError::NotFound(format!(
            "Unknown widget_id: {widget_id}"
        )));
    }

    let user_agent = payload.user_agent.clone().or_else(|| {
        headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let event = AnalyticsEvent {
        id: uuid::Uuid::new_v4().to_string(),
        widget_id,
        event_type,
        notification_id: payload.notification_id.clone(),
        timestamp: payload.timestamp.unwrap_or_else(Utc::now),
        url: payload.url.clone(),
        user_agent,
        ip_address: Some(ip),
    };
    state.store.insert_event(&event).await?;

    Ok(Json(json!({ "success": true })))
}

/// Extract the real client IP from `X-Forwarded-For` (first entry).
/// Falls back to `"unknown"` when the header is absent — those requests
/// then share one rate-limit bucket, which is the conservative direction.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
