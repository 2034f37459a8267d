//! [`WidgetStore`] implementation backed by DuckDB.
//!
//! Thin delegation onto the inherent methods in `widget.rs`,
//! `notification.rs`, and `analytics.rs`.

use async_trait::async_trait;

use prooflet_core::event::AnalyticsEvent;
use prooflet_core::notification::Notification;
use prooflet_core::widget::Widget;
use prooflet_store::{
    CreateNotificationParams, CreateWidgetParams, UpdateNotificationParams, UpdateWidgetParams,
    WidgetStore,
};

use crate::DuckDbBackend;

#[async_trait]
impl WidgetStore for DuckDbBackend {
    async fn create_widget(&self, params: CreateWidgetParams) -> anyhow::Result<Widget> {
        DuckDbBackend::create_widget(self, params).await
    }

    async fn get_widget(&self, id: &str) -> anyhow::Result<Option<Widget>> {
        DuckDbBackend::get_widget(self, id).await
    }

    async fn widget_exists(&self, id: &str) -> anyhow::Result<bool> {
        DuckDbBackend::widget_exists(self, id).await
    }

    async fn update_widget(
        &self,
        id: &str,
        params: UpdateWidgetParams,
    ) -> anyhow::Result<Option<Widget>> {
        DuckDbBackend::update_widget(self, id, params).await
    }

    async fn delete_widget(&self, id: &str) -> anyhow::Result<bool> {
        DuckDbBackend::delete_widget(self, id).await
    }

    async fn create_notification(
        &self,
        widget_id: &str,
        params: CreateNotificationParams,
    ) -> anyhow::Result<Notification> {
        DuckDbBackend::create_notification(self, widget_id, params).await
    }

    async fn get_notification(&self, id: &str) -> anyhow::Result<Option<Notification>> {
        DuckDbBackend::get_notification(self, id).await
    }

    async fn duplicate_notification(&self, id: &str) -> anyhow::Result<Option<Notification>> {
        DuckDbBackend::duplicate_notification(self, id).await
    }

    async fn update_notification(
        &self,
        id: &str,
        params: UpdateNotificationParams,
    ) -> anyhow::Result<Option<Notification>> {
        DuckDbBackend::update_notification(self, id, params).await
    }

    async fn delete_notification(&self, id: &str) -> anyhow::Result<bool> {
        DuckDbBackend::delete_notification(self, id).await
    }

    async fn list_active_notifications(
        &self,
        widget_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<Notification>> {
        DuckDbBackend::list_active_notifications(self, widget_id, limit).await
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> anyhow::Result<()> {
        DuckDbBackend::insert_event(self, event).await
    }
}
