//! Analytics event transport.

use prooflet_core::event::{AnalyticsEventType, TrackPayload};
use tracing::debug;

/// One impression/click/etc. headed for the analytics endpoint.
#[derive(Debug, Clone)]
pub struct OutgoingEvent {
    pub widget_id: String,
    pub event_type: AnalyticsEventType,
    pub notification_id: Option<String>,
    pub url: Option<String>,
}

/// Where the delivery loop reports events.
///
/// `record` must return immediately: the cycle never waits on tracking, so
/// implementations hand the actual send off to a background task. Failures
/// stay inside the implementation.
pub trait EventSink: Send + Sync + 'static {
    fn record(&self, event: OutgoingEvent);
}

/// Beacon-style HTTP sink: one spawned POST per event, no retry.
///
/// A lost event is cheaper than a duplicate one — retrying impressions would
/// inflate the dashboard's numbers, so a send failure is logged and dropped.
pub struct HttpEventSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventSink {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

impl EventSink for HttpEventSink {
    fn record(&self, event: OutgoingEvent) {
        let payload = TrackPayload {
            widget_id: event.widget_id,
            event_type: event.event_type.as_str().to_string(),
            notification_id: event.notification_id,
            timestamp: None,
            url: event.url,
            user_agent: None,
        };
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post(&endpoint).json(&payload).send().await {
                debug!(error = %e, event_type = %payload.event_type, "analytics send failed");
            }
        });
    }
}
