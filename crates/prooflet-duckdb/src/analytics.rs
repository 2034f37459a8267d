use anyhow::Result;

use prooflet_core::event::AnalyticsEvent;

use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Append one analytics event. Rows are write-once: nothing in the
    /// engine ever updates or deletes them (widget cascade delete aside).
    pub async fn insert_event(&self, event: &AnalyticsEvent) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO analytics (
                id, widget_id, event_type, notification_id, event_timestamp,
                url, user_agent, ip_address
            ) VALUES (
                ?1, ?2, ?3, ?4, CAST(?5 AS TIMESTAMP), ?6, ?7, ?8
            )
            "#,
            duckdb::params![
                event.id,
                event.widget_id,
                event.event_type.as_str(),
                event.notification_id,
                event.timestamp.to_rfc3339(),
                event.url,
                event.user_agent,
                event.ip_address,
            ],
        )?;
        Ok(())
    }
}
