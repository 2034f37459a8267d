use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of trackable events. Anything else is rejected with 400
/// before touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    Impression,
    Click,
    ScratchComplete,
    CodeCopied,
}

pub const ACCEPTED_EVENT_TYPES: &[&str] =
    &["impression", "click", "scratch_complete", "code_copied"];

impl AnalyticsEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEventType::Impression => "impression",
            AnalyticsEventType::Click => "click",
            AnalyticsEventType::ScratchComplete => "scratch_complete",
            AnalyticsEventType::CodeCopied => "code_copied",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "impression" => Some(AnalyticsEventType::Impression),
            "click" => Some(AnalyticsEventType::Click),
            "scratch_complete" => Some(AnalyticsEventType::ScratchComplete),
            "code_copied" => Some(AnalyticsEventType::CodeCopied),
            _ => None,
        }
    }
}

/// The payload the embed runtime sends to POST /analytics.
/// `event_type` arrives as a raw string so the handler can reject unknown
/// values with a 400 that lists the accepted enum, rather than a serde error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPayload {
    pub widget_id: String,
    pub event_type: String,
    pub notification_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
}

/// The stored, enriched event — mirrors the `analytics` table.
/// Write-once, append-only; the engine never reads these back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub widget_id: String,
    pub event_type: AnalyticsEventType,
    pub notification_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_parse_matches_accepted_list() {
        for raw in ACCEPTED_EVENT_TYPES {
            assert!(AnalyticsEventType::parse(raw).is_some(), "{raw} should parse");
        }
        assert!(AnalyticsEventType::parse("bogus").is_none());
        assert!(AnalyticsEventType::parse("Impression").is_none());
    }
}
