use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::targeting::TimeWindow;

/// Candidate popup kinds. `Activity` and `Testimonial` are legacy values that
/// older widgets still carry; they render but the editor no longer offers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Purchase,
    Review,
    LiveActivity,
    LowStock,
    Milestone,
    Activity,
    Testimonial,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Purchase => "purchase",
            NotificationType::Review => "review",
            NotificationType::LiveActivity => "live_activity",
            NotificationType::LowStock => "low_stock",
            NotificationType::Milestone => "milestone",
            NotificationType::Activity => "activity",
            NotificationType::Testimonial => "testimonial",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "purchase" => Some(NotificationType::Purchase),
            "review" => Some(NotificationType::Review),
            "live_activity" => Some(NotificationType::LiveActivity),
            "low_stock" => Some(NotificationType::LowStock),
            "milestone" => Some(NotificationType::Milestone),
            "activity" => Some(NotificationType::Activity),
            "testimonial" => Some(NotificationType::Testimonial),
            _ => None,
        }
    }
}

/// The stored notification record — mirrors the `notifications` table.
///
/// Every targeting field is optional; an absent field means "unrestricted on
/// that dimension". Targeting only ever narrows eligibility, it never widens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub widget_id: String,
    pub notification_type: NotificationType,
    pub name: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub product_name: Option<String>,
    /// 1–5 star value for review-type notifications.
    pub rating: Option<u8>,
    pub visitor_count: Option<i64>,
    pub stock_count: Option<i64>,
    pub milestone_text: Option<String>,
    pub is_active: bool,
    /// Display "freshness" reference shown as e.g. "2 hours ago". Editable,
    /// so it is not necessarily the row's creation time.
    pub timestamp: DateTime<Utc>,
    pub click_url: Option<String>,
    pub reward_enabled: bool,
    pub reward_text: Option<String>,
    pub reward_code: Option<String>,
    /// "immediate" | "scroll" | "exit" — evaluated client-side.
    pub behavior_trigger: Option<String>,
    /// Comma-separated glob list, e.g. "/pricing*,/checkout/*".
    pub target_url_patterns: Option<String>,
    pub target_devices: Option<Vec<String>>,
    /// UTM key → expected value. A `None` value means "any value acceptable".
    pub target_utms: Option<HashMap<String, Option<String>>>,
    pub active_time_windows: Option<Vec<TimeWindow>>,
    pub created_at: DateTime<Utc>,
}

/// What the embed runtime actually receives per eligible notification.
///
/// Server-internal fields (`is_active`, device/UTM/time-window rules) are
/// stripped. `target_url_patterns` is passed through because the client-side
/// behavior-trigger logic re-evaluates it against the live URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_text: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_url: Option<String>,
    pub reward_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior_trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url_patterns: Option<String>,
}

impl NotificationView {
    pub fn from_notification(n: &Notification) -> Self {
        Self {
            id: n.id.clone(),
            notification_type: n.notification_type,
            name: n.name.clone(),
            location: n.location.clone(),
            message: n.message.clone(),
            product_name: n.product_name.clone(),
            rating: n.rating,
            visitor_count: n.visitor_count,
            stock_count: n.stock_count,
            milestone_text: n.milestone_text.clone(),
            timestamp: n.timestamp,
            click_url: n.click_url.clone(),
            reward_enabled: n.reward_enabled,
            reward_text: n.reward_text.clone(),
            reward_code: n.reward_code.clone(),
            behavior_trigger: n.behavior_trigger.clone(),
            target_url_patterns: n.target_url_patterns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_round_trips_through_str() {
        for raw in [
            "purchase",
            "review",
            "live_activity",
            "low_stock",
            "milestone",
            "activity",
            "testimonial",
        ] {
            let parsed = NotificationType::parse(raw).expect("known type");
            assert_eq!(parsed.as_str(), raw);
        }
        assert!(NotificationType::parse("bogus").is_none());
    }

    #[test]
    fn view_strips_server_only_fields() {
        let n = Notification {
            id: "n1".to_string(),
            widget_id: "w1".to_string(),
            notification_type: NotificationType::Purchase,
            name: Some("Ada".to_string()),
            location: None,
            message: Some("bought a thing".to_string()),
            product_name: None,
            rating: None,
            visitor_count: None,
            stock_count: None,
            milestone_text: None,
            is_active: true,
            timestamp: Utc::now(),
            click_url: None,
            reward_enabled: false,
            reward_text: None,
            reward_code: None,
            behavior_trigger: None,
            target_url_patterns: Some("/pricing*".to_string()),
            target_devices: Some(vec!["mobile".to_string()]),
            target_utms: None,
            active_time_windows: None,
            created_at: Utc::now(),
        };
        let view = NotificationView::from_notification(&n);
        let json = serde_json::to_value(&view).expect("serialize view");
        // The behavior-trigger re-evaluation needs URL patterns client-side.
        assert_eq!(json["target_url_patterns"], "/pricing*");
        // Device rules and the active flag stay server-side.
        assert!(json.get("target_devices").is_none());
        assert!(json.get("is_active").is_none());
    }
}
