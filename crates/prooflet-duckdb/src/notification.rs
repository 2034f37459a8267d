use anyhow::{anyhow, Result};
use chrono::Utc;
use uuid::Uuid;

use prooflet_core::notification::{Notification, NotificationType};
use prooflet_store::{CreateNotificationParams, UpdateNotificationParams};

use crate::backend::{conv_err, opt_json, parse_db_timestamp, to_json_opt};
use crate::DuckDbBackend;

const NOTIFICATION_COLUMNS: &str = "\
    id, widget_id, notification_type, name, location, message, product_name, \
    rating, visitor_count, stock_count, milestone_text, is_active, \
    CAST(display_timestamp AS VARCHAR), click_url, reward_enabled, reward_text, \
    reward_code, behavior_trigger, target_url_patterns, target_devices, \
    target_utms, active_time_windows, CAST(created_at AS VARCHAR)";

fn map_notification_row(row: &duckdb::Row<'_>) -> Result<Notification, duckdb::Error> {
    let type_raw: String = row.get(2)?;
    let notification_type = NotificationType::parse(&type_raw)
        .ok_or_else(|| conv_err(2, format!("unknown notification type {type_raw:?}")))?;
    let display_raw: String = row.get(12)?;
    let created_raw: String = row.get(22)?;
    Ok(Notification {
        id: row.get(0)?,
        widget_id: row.get(1)?,
        notification_type,
        name: row.get(3)?,
        location: row.get(4)?,
        message: row.get(5)?,
        product_name: row.get(6)?,
        rating: row
            .get::<_, Option<i64>>(7)?
            .and_then(|v| u8::try_from(v).ok()),
        visitor_count: row.get(8)?,
        stock_count: row.get(9)?,
        milestone_text: row.get(10)?,
        is_active: row.get(11)?,
        timestamp: parse_db_timestamp(&display_raw).map_err(|e| conv_err(12, e))?,
        click_url: row.get(13)?,
        reward_enabled: row.get(14)?,
        reward_text: row.get(15)?,
        reward_code: row.get(16)?,
        behavior_trigger: row.get(17)?,
        target_url_patterns: row.get(18)?,
        target_devices: opt_json(row, 19)?,
        target_utms: opt_json(row, 20)?,
        active_time_windows: opt_json(row, 21)?,
        created_at: parse_db_timestamp(&created_raw).map_err(|e| conv_err(22, e))?,
    })
}

impl DuckDbBackend {
    async fn insert_notification(&self, n: &Notification) -> Result<()> {
        let target_devices = to_json_opt(n.target_devices.as_ref())?;
        let target_utms = to_json_opt(n.target_utms.as_ref())?;
        let active_time_windows = to_json_opt(n.active_time_windows.as_ref())?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO notifications (
                id, widget_id, notification_type, name, location, message,
                product_name, rating, visitor_count, stock_count, milestone_text,
                is_active, display_timestamp, click_url, reward_enabled,
                reward_text, reward_code, behavior_trigger, target_url_patterns,
                target_devices, target_utms, active_time_windows, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                CAST(?13 AS TIMESTAMP), ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                CURRENT_TIMESTAMP
            )
            "#,
            duckdb::params![
                n.id,
                n.widget_id,
                n.notification_type.as_str(),
                n.name,
                n.location,
                n.message,
                n.product_name,
                n.rating.map(i64::from),
                n.visitor_count,
                n.stock_count,
                n.milestone_text,
                n.is_active,
                n.timestamp.to_rfc3339(),
                n.click_url,
                n.reward_enabled,
                n.reward_text,
                n.reward_code,
                n.behavior_trigger,
                n.target_url_patterns,
                target_devices,
                target_utms,
                active_time_windows,
            ],
        )?;
        Ok(())
    }

    pub async fn create_notification(
        &self,
        widget_id: &str,
        params: CreateNotificationParams,
    ) -> Result<Notification> {
        let now = Utc::now();
        let n = Notification {
            id: Uuid::new_v4().to_string(),
            widget_id: widget_id.to_string(),
            notification_type: params.notification_type,
            name: params.name,
            location: params.location,
            message: params.message,
            product_name: params.product_name,
            rating: params.rating,
            visitor_count: params.visitor_count,
            stock_count: params.stock_count,
            milestone_text: params.milestone_text,
            is_active: params.is_active,
            timestamp: params.timestamp.unwrap_or(now),
            click_url: params.click_url,
            reward_enabled: params.reward_enabled,
            reward_text: params.reward_text,
            reward_code: params.reward_code,
            behavior_trigger: params.behavior_trigger,
            target_url_patterns: params.target_url_patterns,
            target_devices: params.target_devices,
            target_utms: params.target_utms,
            active_time_windows: params.active_time_windows,
            created_at: now,
        };
        self.insert_notification(&n).await?;
        self.get_notification(&n.id)
            .await?
            .ok_or_else(|| anyhow!("notification not found after create"))
    }

    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"
        ))?;
        Ok(stmt
            .query_row(duckdb::params![id], map_notification_row)
            .ok())
    }

    /// Clone an existing notification in place: every field is copied except
    /// the identity and the freshness timestamp, which are regenerated.
    pub async fn duplicate_notification(&self, id: &str) -> Result<Option<Notification>> {
        let Some(existing) = self.get_notification(id).await? else {
            return Ok(None);
        };
        let clone = Notification {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            ..existing
        };
        self.insert_notification(&clone).await?;
        self.get_notification(&clone.id).await
    }

    pub async fn update_notification(
        &self,
        id: &str,
        params: UpdateNotificationParams,
    ) -> Result<Option<Notification>> {
        let Some(existing) = self.get_notification(id).await? else {
            return Ok(None);
        };
        let merged = Notification {
            id: existing.id.clone(),
            widget_id: existing.widget_id.clone(),
            notification_type: existing.notification_type,
            name: params.name.unwrap_or(existing.name),
            location: params.location.unwrap_or(existing.location),
            message: params.message.unwrap_or(existing.message),
            product_name: params.product_name.unwrap_or(existing.product_name),
            rating: params.rating.unwrap_or(existing.rating),
            visitor_count: params.visitor_count.unwrap_or(existing.visitor_count),
            stock_count: params.stock_count.unwrap_or(existing.stock_count),
            milestone_text: params.milestone_text.unwrap_or(existing.milestone_text),
            is_active: params.is_active.unwrap_or(existing.is_active),
            timestamp: params.timestamp.unwrap_or(existing.timestamp),
            click_url: params.click_url.unwrap_or(existing.click_url),
            reward_enabled: params.reward_enabled.unwrap_or(existing.reward_enabled),
            reward_text: params.reward_text.unwrap_or(existing.reward_text),
            reward_code: params.reward_code.unwrap_or(existing.reward_code),
            behavior_trigger: params.behavior_trigger.unwrap_or(existing.behavior_trigger),
            target_url_patterns: params
                .target_url_patterns
                .unwrap_or(existing.target_url_patterns),
            target_devices: params.target_devices.unwrap_or(existing.target_devices),
            target_utms: params.target_utms.unwrap_or(existing.target_utms),
            active_time_windows: params
                .active_time_windows
                .unwrap_or(existing.active_time_windows),
            created_at: existing.created_at,
        };

        let target_devices = to_json_opt(merged.target_devices.as_ref())?;
        let target_utms = to_json_opt(merged.target_utms.as_ref())?;
        let active_time_windows = to_json_opt(merged.active_time_windows.as_ref())?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            UPDATE notifications
            SET name = ?1,
                location = ?2,
                message = ?3,
                product_name = ?4,
                rating = ?5,
                visitor_count = ?6,
                stock_count = ?7,
                milestone_text = ?8,
                is_active = ?9,
                display_timestamp = CAST(?10 AS TIMESTAMP),
                click_url = ?11,
                reward_enabled = ?12,
                reward_text = ?13,
                reward_code = ?14,
                behavior_trigger = ?15,
                target_url_patterns = ?16,
                target_devices = ?17,
                target_utms = ?18,
                active_time_windows = ?19
            WHERE id = ?20
            "#,
            duckdb::params![
                merged.name,
                merged.location,
                merged.message,
                merged.product_name,
                merged.rating.map(i64::from),
                merged.visitor_count,
                merged.stock_count,
                merged.milestone_text,
                merged.is_active,
                merged.timestamp.to_rfc3339(),
                merged.click_url,
                merged.reward_enabled,
                merged.reward_text,
                merged.reward_code,
                merged.behavior_trigger,
                merged.target_url_patterns,
                target_devices,
                target_utms,
                active_time_windows,
                id,
            ],
        )?;
        drop(conn);
        self.get_notification(id).await
    }

    pub async fn delete_notification(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            "DELETE FROM notifications WHERE id = ?1",
            duckdb::params![id],
        )?;
        Ok(rows > 0)
    }

    pub async fn list_active_notifications(
        &self,
        widget_id: &str,
        limit: u32,
    ) -> Result<Vec<Notification>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE widget_id = ?1 AND is_active = TRUE
            ORDER BY display_timestamp DESC, id DESC
            LIMIT ?2
            "#
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map(
            duckdb::params![widget_id, i64::from(limit)],
            map_notification_row,
        )? {
            out.push(row?);
        }
        Ok(out)
    }
}
