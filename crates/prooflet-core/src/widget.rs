use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The stored widget record — mirrors the `widgets` table.
///
/// Styling and timing fields are optional at rest; defaults are filled in
/// server-side by [`DisplaySettings::from_widget`] so the embed runtime never
/// needs its own default table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub account_id: String,
    pub name: String,
    /// Installation domain, compared against the request referrer as an
    /// advisory check.
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
    /// Widget-level targeting: when set, the whole widget only serves on
    /// matching devices/paths. Evaluated with the same fail-open predicates
    /// as per-notification rules.
    pub target_devices: Option<Vec<String>>,
    pub target_url_patterns: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Widget display settings as served to the embed, every default resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub id: String,
    pub position: String,
    pub color: String,
    pub radius: u32,
    pub shadow: String,
    pub animation: String,
    pub duration: u32,
    pub gap: u32,
    pub start_delay: u32,
    #[serde(rename = "loop")]
    pub loop_enabled: bool,
    pub shuffle: bool,
    pub bg_color: String,
    pub bg_opacity: u32,
}

impl DisplaySettings {
    pub fn from_widget(w: &Widget) -> Self {
        Self {
            id: w.id.clone(),
            position: w
                .position
                .clone()
                .unwrap_or_else(|| "bottom-left".to_string()),
            color: w.color.clone().unwrap_or_else(|| "#333333".to_string()),
            radius: w.radius.unwrap_or(14),
            shadow: w.shadow.clone().unwrap_or_else(|| "medium".to_string()),
            animation: w
                .animation
                .clone()
                .unwrap_or_else(|| "standard".to_string()),
            duration: w.duration_seconds.unwrap_or(6),
            gap: w.gap_seconds.unwrap_or(2),
            start_delay: w.start_delay_seconds.unwrap_or(2),
            // Looping is the default; only an explicit false turns it off.
            loop_enabled: w.loop_enabled.unwrap_or(true),
            shuffle: w.shuffle.unwrap_or(false),
            bg_color: w.bg_color.clone().unwrap_or_else(|| "#FFFFFF".to_string()),
            bg_opacity: w.bg_opacity.unwrap_or(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_widget() -> Widget {
        Widget {
            id: "w1".to_string(),
            account_id: "acct1".to_string(),
            name: "Homepage widget".to_string(),
            domain: None,
            position: None,
            color: None,
            radius: None,
            shadow: None,
            animation: None,
            duration_seconds: None,
            gap_seconds: None,
            start_delay_seconds: None,
            loop_enabled: None,
            shuffle: None,
            bg_color: None,
            bg_opacity: None,
            target_devices: None,
            target_url_patterns: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn defaults_fill_every_optional_field() {
        let s = DisplaySettings::from_widget(&bare_widget());
        assert_eq!(s.duration, 6);
        assert_eq!(s.gap, 2);
        assert_eq!(s.start_delay, 2);
        assert!(s.loop_enabled);
        assert!(!s.shuffle);
        assert_eq!(s.radius, 14);
        assert_eq!(s.shadow, "medium");
        assert_eq!(s.animation, "standard");
        assert_eq!(s.bg_color, "#FFFFFF");
        assert_eq!(s.bg_opacity, 100);
    }

    #[test]
    fn explicit_false_loop_survives_defaulting() {
        let mut w = bare_widget();
        w.loop_enabled = Some(false);
        w.shuffle = Some(true);
        let s = DisplaySettings::from_widget(&w);
        assert!(!s.loop_enabled);
        assert!(s.shuffle);
    }

    #[test]
    fn loop_serializes_under_wire_name() {
        let s = DisplaySettings::from_widget(&bare_widget());
        let json = serde_json::to_value(&s).expect("serialize settings");
        assert_eq!(json["loop"], true);
    }
}
