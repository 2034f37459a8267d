use anyhow::{anyhow, Result};
use uuid::Uuid;

use prooflet_core::widget::Widget;
use prooflet_store::{CreateWidgetParams, UpdateWidgetParams};

use crate::backend::{conv_err, opt_json, parse_db_timestamp, to_json_opt};
use crate::DuckDbBackend;

const WIDGET_COLUMNS: &str = "\
    id, account_id, name, domain, position, color, radius, shadow, animation, \
    duration_seconds, gap_seconds, start_delay_seconds, loop_enabled, shuffle, \
    bg_color, bg_opacity, target_devices, target_url_patterns, \
    CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)";

fn opt_u32(row: &duckdb::Row<'_>, idx: usize) -> Result<Option<u32>, duckdb::Error> {
    Ok(row
        .get::<_, Option<i64>>(idx)?
        .and_then(|v| u32::try_from(v).ok()))
}

fn map_widget_row(row: &duckdb::Row<'_>) -> Result<Widget, duckdb::Error> {
    let created_raw: String = row.get(18)?;
    let updated_raw: String = row.get(19)?;
    Ok(Widget {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        domain: row.get(3)?,
        position: row.get(4)?,
        color: row.get(5)?,
        radius: opt_u32(row, 6)?,
        shadow: row.get(7)?,
        animation: row.get(8)?,
        duration_seconds: opt_u32(row, 9)?,
        gap_seconds: opt_u32(row, 10)?,
        start_delay_seconds: opt_u32(row, 11)?,
        loop_enabled: row.get(12)?,
        shuffle: row.get(13)?,
        bg_color: row.get(14)?,
        bg_opacity: opt_u32(row, 15)?,
        target_devices: opt_json(row, 16)?,
        target_url_patterns: row.get(17)?,
        created_at: parse_db_timestamp(&created_raw).map_err(|e| conv_err(18, e))?,
        updated_at: parse_db_timestamp(&updated_raw).map_err(|e| conv_err(19, e))?,
    })
}

impl DuckDbBackend {
    pub async fn create_widget(&self, params: CreateWidgetParams) -> Result<Widget> {
        let id = Uuid::new_v4().to_string();
        let target_devices = to_json_opt(params.target_devices.as_ref())?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO widgets (
                id, account_id, name, domain, position, color, radius, shadow,
                animation, duration_seconds, gap_seconds, start_delay_seconds,
                loop_enabled, shuffle, bg_color, bg_opacity, target_devices,
                target_url_patterns, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP
            )
            "#,
            duckdb::params![
                id,
                params.account_id,
                params.name,
                params.domain,
                params.position,
                params.color,
                params.radius,
                params.shadow,
                params.animation,
                params.duration_seconds,
                params.gap_seconds,
                params.start_delay_seconds,
                params.loop_enabled,
                params.shuffle,
                params.bg_color,
                params.bg_opacity,
                target_devices,
                params.target_url_patterns,
            ],
        )?;
        drop(conn);
        self.get_widget(&id)
            .await?
            .ok_or_else(|| anyhow!("widget not found after create"))
    }

    pub async fn get_widget(&self, id: &str) -> Result<Option<Widget>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {WIDGET_COLUMNS} FROM widgets WHERE id = ?1"
        ))?;
        Ok(stmt.query_row(duckdb::params![id], map_widget_row).ok())
    }

    pub async fn widget_exists(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .prepare("SELECT COUNT(*) FROM widgets WHERE id = ?1")?
            .query_row(duckdb::params![id], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub async fn update_widget(
        &self,
        id: &str,
        params: UpdateWidgetParams,
    ) -> Result<Option<Widget>> {
        let Some(existing) = self.get_widget(id).await? else {
            return Ok(None);
        };
        let name = params.name.unwrap_or(existing.name);
        let domain = params.domain.or(existing.domain);
        let position = params.position.or(existing.position);
        let color = params.color.or(existing.color);
        let radius = params.radius.or(existing.radius);
        let shadow = params.shadow.or(existing.shadow);
        let animation = params.animation.or(existing.animation);
        let duration_seconds = params.duration_seconds.or(existing.duration_seconds);
        let gap_seconds = params.gap_seconds.or(existing.gap_seconds);
        let start_delay_seconds = params.start_delay_seconds.or(existing.start_delay_seconds);
        let loop_enabled = params.loop_enabled.or(existing.loop_enabled);
        let shuffle = params.shuffle.or(existing.shuffle);
        let bg_color = params.bg_color.or(existing.bg_color);
        let bg_opacity = params.bg_opacity.or(existing.bg_opacity);
        let target_devices = params.target_devices.unwrap_or(existing.target_devices);
        let target_url_patterns = params
            .target_url_patterns
            .unwrap_or(existing.target_url_patterns);

        let target_devices_json = to_json_opt(target_devices.as_ref())?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            UPDATE widgets
            SET name = ?1,
                domain = ?2,
                position = ?3,
                color = ?4,
                radius = ?5,
                shadow = ?6,
                animation = ?7,
                duration_seconds = ?8,
                gap_seconds = ?9,
                start_delay_seconds = ?10,
                loop_enabled = ?11,
                shuffle = ?12,
                bg_color = ?13,
                bg_opacity = ?14,
                target_devices = ?15,
                target_url_patterns = ?16,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?17
            "#,
            duckdb::params![
                name,
                domain,
                position,
                color,
                radius,
                shadow,
                animation,
                duration_seconds,
                gap_seconds,
                start_delay_seconds,
                loop_enabled,
                shuffle,
                bg_color,
                bg_opacity,
                target_devices_json,
                target_url_patterns,
                id,
            ],
        )?;
        drop(conn);
        self.get_widget(id).await
    }

    /// Delete a widget and everything it owns.
    ///
    /// Children first, all inside one transaction, so a crash mid-delete
    /// never leaves orphaned notification or analytics rows behind.
    pub async fn delete_widget(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM analytics WHERE widget_id = ?1",
            duckdb::params![id],
        )?;
        tx.execute(
            "DELETE FROM notifications WHERE widget_id = ?1",
            duckdb::params![id],
        )?;
        let rows = tx.execute("DELETE FROM widgets WHERE id = ?1", duckdb::params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }
}
