use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use prooflet_core::event::AnalyticsEvent;
use prooflet_core::notification::{Notification, NotificationType};
use prooflet_core::targeting::TimeWindow;
use prooflet_core::widget::Widget;

#[derive(Debug, Clone)]
pub struct CreateWidgetParams {
    pub account_id: String,
    pub name: String,
    pub domain: Option<String>,
    pub position: Option<String>,
    pub color: Option<String>,
    pub radius: Option<u32>,
    pub shadow: Option<String>,
    pub animation: Option<String>,
    pub duration_seconds: Option<u32>,
    pub gap_seconds: Option<u32>,
    pub start_delay_seconds: Option<u32>,
    pub loop_enabled: Option<bool>,
    pub shuffle: Option<bool>,
    pub bg_color: Option<String>,
    pub bg_opacity: Option<u32>,
    pub target_devices: Option<Vec<String>>,
    pub target_url_patterns: Option<String>,
}

/// `None` leaves the field unchanged. The two widget-level targeting fields
/// are clearable, so they use the outer/inner Option convention.
#[derive(Debug, Clone, Default)]
pub struct UpdateWidgetParams {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub position: Option<String>,
    pub color: Option<String>,
    pub radius: Option<u32>,
    pub shadow: Option<String>,
    pub animation: Option<String>,
    pub duration_seconds: Option<u32>,
    pub gap_seconds: Option<u32>,
    pub start_delay_seconds: Option<u32>,
    pub loop_enabled: Option<bool>,
    pub shuffle: Option<bool>,
    pub bg_color: Option<String>,
    pub bg_opacity: Option<u32>,
    pub target_devices: Option<Option<Vec<String>>>,
    pub target_url_patterns: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct CreateNotificationParams {
    pub notification_type: NotificationType,
    pub name: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub product_name: Option<String>,
    pub rating: Option<u8>,
    pub visitor_count: Option<i64>,
    pub stock_count: Option<i64>,
    pub milestone_text: Option<String>,
    pub is_active: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub click_url: Option<String>,
    pub reward_enabled: bool,
    pub reward_text: Option<String>,
    pub reward_code: Option<String>,
    pub behavior_trigger: Option<String>,
    pub target_url_patterns: Option<String>,
    pub target_devices: Option<Vec<String>>,
    pub target_utms: Option<HashMap<String, Option<String>>>,
    pub active_time_windows: Option<Vec<TimeWindow>>,
}

/// `None` leaves the field unchanged. Targeting fields use a double Option:
/// the outer level is "touch or not", the inner is "set or clear".
#[derive(Debug, Clone, Default)]
pub struct UpdateNotificationParams {
    pub name: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub message: Option<Option<String>>,
    pub product_name: Option<Option<String>>,
    pub rating: Option<Option<u8>>,
    pub visitor_count: Option<Option<i64>>,
    pub stock_count: Option<Option<i64>>,
    pub milestone_text: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub timestamp: Option<DateTime<Utc>>,
    pub click_url: Option<Option<String>>,
    pub reward_enabled: Option<bool>,
    pub reward_text: Option<Option<String>>,
    pub reward_code: Option<Option<String>>,
    pub behavior_trigger: Option<Option<String>>,
    pub target_url_patterns: Option<Option<String>>,
    pub target_devices: Option<Option<Vec<String>>>,
    pub target_utms: Option<Option<HashMap<String, Option<String>>>>,
    pub active_time_windows: Option<Option<Vec<TimeWindow>>>,
}

/// Storage interface for widgets, notifications, and analytics events.
///
/// Self-hosted mode uses a DuckDB implementation. A deployment can swap in
/// another backend (Postgres, an HTTP facade over an existing dashboard
/// database) while keeping the server crate unchanged.
#[async_trait]
pub trait WidgetStore: Send + Sync + 'static {
    async fn create_widget(&self, params: CreateWidgetParams) -> anyhow::Result<Widget>;
    async fn get_widget(&self, id: &str) -> anyhow::Result<Option<Widget>>;
    async fn widget_exists(&self, id: &str) -> anyhow::Result<bool>;
    async fn update_widget(
        &self,
        id: &str,
        params: UpdateWidgetParams,
    ) -> anyhow::Result<Option<Widget>>;
    /// Deletes the widget together with its notifications and analytics rows
    /// (owned 1-to-many), in one transaction. Returns false when the id is
    /// unknown.
    async fn delete_widget(&self, id: &str) -> anyhow::Result<bool>;

    async fn create_notification(
        &self,
        widget_id: &str,
        params: CreateNotificationParams,
    ) -> anyhow::Result<Notification>;
    async fn get_notification(&self, id: &str) -> anyhow::Result<Option<Notification>>;
    /// Clone an existing notification: every field is copied except the
    /// identity and the freshness timestamp, which are regenerated.
    async fn duplicate_notification(&self, id: &str) -> anyhow::Result<Option<Notification>>;
    async fn update_notification(
        &self,
        id: &str,
        params: UpdateNotificationParams,
    ) -> anyhow::Result<Option<Notification>>;
    async fn delete_notification(&self, id: &str) -> anyhow::Result<bool>;
    /// Active notifications for a widget, most recent `timestamp` first,
    /// at most `limit` rows.
    async fn list_active_notifications(
        &self,
        widget_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<Notification>>;

    /// Append-only; events are never updated or read back by the engine.
    async fn insert_event(&self, event: &AnalyticsEvent) -> anyhow::Result<()>;
}

/// Fixed-window counter keyed by source identity, for the analytics
/// endpoint's per-IP rate limit.
///
/// The server ships an in-process map implementation; because the endpoint
/// only sees this trait, a production deployment can back it with a shared
/// store (Redis, a database) without touching the endpoint contract.
#[async_trait]
pub trait RateCounter: Send + Sync + 'static {
    /// Increment the counter for `key` in the window containing "now" and
    /// return the post-increment count for that window.
    async fn incr(&self, key: &str, window_secs: u64) -> anyhow::Result<u32>;
}
