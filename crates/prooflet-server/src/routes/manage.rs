//! Management routes for widgets and notifications.
//!
//! The dashboard (an external collaborator) drives these with plain JSON;
//! there is no HTML surface here. Field validation happens at this layer so
//! the store only ever sees well-formed values.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::json;

use prooflet_core::notification::NotificationType;
use prooflet_core::targeting::TimeWindow;
use prooflet_store::{
    CreateNotificationParams, CreateWidgetParams, UpdateNotificationParams, UpdateWidgetParams,
    WidgetStore,
};

use crate::{error::AppError, state::AppState};

/// Distinguish "field absent" (leave unchanged) from "field null" (clear):
/// absent deserializes to `None` via `#[serde(default)]`, explicit null to
/// `Some(None)`.
fn deserialize_tri_state<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None => Ok(Some(None)),
        Some(raw) => T::deserialize(raw)
            .map(|parsed| Some(Some(parsed)))
            .map_err(D::Error::custom),
    }
}

fn positive_u32(value: Option<i64>, field: &str) -> Result<Option<u32>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if v > 0 => {
            u32::try_from(v).map(Some).map_err(|_| {
                AppError::BadRequest(format!("{field} is too large"))
            })
        }
        Some(_) => Err(AppError::BadRequest(format!("{field} must be > 0"))),
    }
}

fn opacity_u32(value: Option<i64>) -> Result<Option<u32>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if (0..=100).contains(&v) => Ok(Some(v as u32)),
        Some(_) => Err(AppError::BadRequest(
            "bg_opacity must be between 0 and 100".to_string(),
        )),
    }
}

fn rating_u8(value: Option<i64>) -> Result<Option<u8>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if (1..=5).contains(&v) => Ok(Some(v as u8)),
        Some(_) => Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        )),
    }
}

fn validated_click_url(value: Option<String>) -> Result<Option<String>, AppError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let parsed = url::Url::parse(raw.trim())
        .map_err(|_| AppError::BadRequest("click_url must be a valid URL".to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::BadRequest(
            "click_url must use http or https".to_string(),
        ));
    }
    Ok(Some(raw))
}

fn parse_notification_type(raw: &str) -> Result<NotificationType, AppError> {
    NotificationType::parse(raw).ok_or_else(|| {
        AppError::BadRequest(
            "type must be one of: purchase, review, live_activity, low_stock, milestone, \
             activity, testimonial"
                .to_string(),
        )
    })
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWidgetRequest {
    pub account_id: String,
    pub name: String,
    pub domain: Option<String>,
    pub position: Option<String>,
    pub color: Option<String>,
    pub radius: Option<i64>,
    pub shadow: Option<String>,
    pub animation: Option<String>,
    pub duration: Option<i64>,
    pub gap: Option<i64>,
    pub start_delay: Option<i64>,
    #[serde(rename = "loop")]
    pub loop_enabled: Option<bool>,
    pub shuffle: Option<bool>,
    pub bg_color: Option<String>,
    pub bg_opacity: Option<i64>,
    pub target_devices: Option<Vec<String>>,
    pub target_url_patterns: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateWidgetRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub position: Option<String>,
    pub color: Option<String>,
    pub radius: Option<i64>,
    pub shadow: Option<String>,
    pub animation: Option<String>,
    pub duration: Option<i64>,
    pub gap: Option<i64>,
    pub start_delay: Option<i64>,
    #[serde(rename = "loop")]
    pub loop_enabled: Option<bool>,
    pub shuffle: Option<bool>,
    pub bg_color: Option<String>,
    pub bg_opacity: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub target_devices: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub target_url_patterns: Option<Option<String>>,
}

#[tracing::instrument(skip(state, body))]
pub async fn create_widget(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateWidgetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.account_id.trim().is_empty() {
        return Err(AppError::BadRequest("account_id is required".to_string()));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let widget = state
        .store
        .create_widget(CreateWidgetParams {
            account_id: body.account_id,
            name: body.name,
            domain: body.domain,
            position: body.position,
            color: body.color,
            radius: positive_u32(body.radius, "radius")?,
            shadow: body.shadow,
            animation: body.animation,
            duration_seconds: positive_u32(body.duration, "duration")?,
            gap_seconds: positive_u32(body.gap, "gap")?,
            start_delay_seconds: positive_u32(body.start_delay, "start_delay")?,
            loop_enabled: body.loop_enabled,
            shuffle: body.shuffle,
            bg_color: body.bg_color,
            bg_opacity: opacity_u32(body.bg_opacity)?,
            target_devices: body.target_devices,
            target_url_patterns: body.target_url_patterns,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": widget }))))
}

#[tracing::instrument(skip(state))]
pub async fn get_widget(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let widget = state
        .store
        .get_widget(&widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;
    Ok(Json(json!({ "data": widget })))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_widget(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<String>,
    Json(body): Json<UpdateWidgetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let widget = state
        .store
        .update_widget(
            &widget_id,
            UpdateWidgetParams {
                name: body.name,
                domain: body.domain,
                position: body.position,
                color: body.color,
                radius: positive_u32(body.radius, "radius")?,
                shadow: body.shadow,
                animation: body.animation,
                duration_seconds: positive_u32(body.duration, "duration")?,
                gap_seconds: positive_u32(body.gap, "gap")?,
                start_delay_seconds: positive_u32(body.start_delay, "start_delay")?,
                loop_enabled: body.loop_enabled,
                shuffle: body.shuffle,
                bg_color: body.bg_color,
                bg_opacity: opacity_u32(body.bg_opacity)?,
                target_devices: body.target_devices,
                target_url_patterns: body.target_url_patterns,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;
    Ok(Json(json!({ "data": widget })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_widget(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_widget(&widget_id).await? {
        return Err(AppError::NotFound("Widget not found".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub product_name: Option<String>,
    pub rating: Option<i64>,
    pub visitor_count: Option<i64>,
    pub stock_count: Option<i64>,
    pub milestone_text: Option<String>,
    pub is_active: Option<bool>,
    pub timestamp: Option<DateTime<Utc>>,
    pub click_url: Option<String>,
    pub reward_enabled: Option<bool>,
    pub reward_text: Option<String>,
    pub reward_code: Option<String>,
    pub behavior_trigger: Option<String>,
    pub target_url_patterns: Option<String>,
    pub target_devices: Option<Vec<String>>,
    pub target_utms: Option<HashMap<String, Option<String>>>,
    pub active_time_windows: Option<Vec<TimeWindow>>,
}

/// PATCH body. Clearable fields use the tri-state deserializer: omitting a
/// field leaves it unchanged, sending `null` clears it (which for targeting
/// fields restores "unrestricted").
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotificationRequest {
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub message: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub product_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub rating: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub visitor_count: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub stock_count: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub milestone_text: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub click_url: Option<Option<String>>,
    pub reward_enabled: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub reward_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub reward_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub behavior_trigger: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub target_url_patterns: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub target_devices: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub target_utms: Option<Option<HashMap<String, Option<String>>>>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub active_time_windows: Option<Option<Vec<TimeWindow>>>,
}

#[tracing::instrument(skip(state, body))]
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<String>,
    Json(body): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.widget_exists(&widget_id).await? {
        return Err(AppError::NotFound("Widget not found".to_string()));
    }
    let notification = state
        .store
        .create_notification(
            &widget_id,
            CreateNotificationParams {
                notification_type: parse_notification_type(&body.notification_type)?,
                name: body.name,
                location: body.location,
                message: body.message,
                product_name: body.product_name,
                rating: rating_u8(body.rating)?,
                visitor_count: body.visitor_count,
                stock_count: body.stock_count,
                milestone_text: body.milestone_text,
                is_active: body.is_active.unwrap_or(true),
                timestamp: body.timestamp,
                click_url: validated_click_url(body.click_url)?,
                reward_enabled: body.reward_enabled.unwrap_or(false),
                reward_text: body.reward_text,
                reward_code: body.reward_code,
                behavior_trigger: body.behavior_trigger,
                target_url_patterns: body.target_url_patterns,
                target_devices: body.target_devices,
                target_utms: body.target_utms,
                active_time_windows: body.active_time_windows,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": notification }))))
}

#[tracing::instrument(skip(state))]
pub async fn duplicate_notification(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let clone = state
        .store
        .duplicate_notification(&notification_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(json!({ "data": clone }))))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_notification(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
    Json(body): Json<UpdateNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rating = match body.rating {
        Some(value) => Some(rating_u8(value)?),
        None => None,
    };
    let click_url = match body.click_url {
        Some(value) => Some(validated_click_url(value)?),
        None => None,
    };
    let notification = state
        .store
        .update_notification(
            &notification_id,
            UpdateNotificationParams {
                name: body.name,
                location: body.location,
                message: body.message,
                product_name: body.product_name,
                rating,
                visitor_count: body.visitor_count,
                stock_count: body.stock_count,
                milestone_text: body.milestone_text,
                is_active: body.is_active,
                timestamp: body.timestamp,
                click_url,
                reward_enabled: body.reward_enabled,
                reward_text: body.reward_text,
                reward_code: body.reward_code,
                behavior_trigger: body.behavior_trigger,
                target_url_patterns: body.target_url_patterns,
                target_devices: body.target_devices,
                target_utms: body.target_utms,
                active_time_windows: body.active_time_windows,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(Json(json!({ "data": notification })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_notification(&notification_id).await? {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}
