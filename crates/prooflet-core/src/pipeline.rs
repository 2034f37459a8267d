//! Targeting filter pipeline.
//!
//! Applies the predicate library in a fixed order — URL, device, UTM, time
//! window — to each notification, short-circuiting on the first failing
//! dimension. The predicates are total functions (parse failures resolve to
//! "allow" inside each one), so there is no outer catch layer here: a broken
//! rule can only ever widen eligibility, never hide a notification.

use chrono::{DateTime, Utc};

use crate::context::RequestContext;
use crate::notification::Notification;
use crate::targeting;

/// Filter result plus per-dimension removal counts for the response
/// diagnostics block.
#[derive(Debug, Default)]
pub struct TargetingOutcome {
    pub kept: Vec<Notification>,
    pub removed_by_url: usize,
    pub removed_by_device: usize,
    pub removed_by_utm: usize,
    pub removed_by_time: usize,
}

impl TargetingOutcome {
    pub fn removed_total(&self) -> usize {
        self.removed_by_url + self.removed_by_device + self.removed_by_utm + self.removed_by_time
    }

    /// True iff targeting actually removed something for this request.
    pub fn targeting_applied(&self) -> bool {
        self.removed_total() > 0
    }
}

/// Evaluate every notification against the request context at instant `now`.
///
/// `now` is injected rather than read from the wall clock so the time-window
/// dimension is testable at exact boundaries.
pub fn apply_targeting(
    input: Vec<Notification>,
    ctx: &RequestContext,
    now: DateTime<Utc>,
) -> TargetingOutcome {
    let mut outcome = TargetingOutcome::default();

    for n in input {
        if !targeting::url_patterns_match(n.target_url_patterns.as_deref(), ctx.path.as_deref()) {
            outcome.removed_by_url += 1;
            continue;
        }
        if !targeting::devices_match(n.target_devices.as_deref(), ctx.device.as_deref()) {
            outcome.removed_by_device += 1;
            continue;
        }
        if !targeting::utms_match(n.target_utms.as_ref(), ctx) {
            outcome.removed_by_utm += 1;
            continue;
        }
        if !targeting::time_windows_match(n.active_time_windows.as_deref(), now) {
            outcome.removed_by_time += 1;
            continue;
        }
        outcome.kept.push(n);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use crate::notification::NotificationType;
    use crate::targeting::TimeWindow;

    use super::*;

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            widget_id: "w1".to_string(),
            notification_type: NotificationType::Purchase,
            name: Some("Ada".to_string()),
            location: None,
            message: Some("bought".to_string()),
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
            target_url_patterns: None,
            target_devices: None,
            target_utms: None,
            active_time_windows: None,
            created_at: Utc::now(),
        }
    }

    fn noon_monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn untargeted_notifications_pass_through_unchanged() {
        let input = vec![notification("a"), notification("b")];
        let out = apply_targeting(input, &RequestContext::default(), noon_monday());
        assert_eq!(out.kept.len(), 2);
        assert_eq!(out.removed_total(), 0);
        assert!(!out.targeting_applied());
    }

    #[test]
    fn first_failing_dimension_claims_the_removal() {
        // Fails URL and device both; only the URL counter may move.
        let mut n = notification("a");
        n.target_url_patterns = Some("/pricing".to_string());
        n.target_devices = Some(vec!["mobile".to_string()]);
        let ctx = RequestContext {
            path: Some("/about".to_string()),
            device: Some("desktop".to_string()),
            ..Default::default()
        };
        let out = apply_targeting(vec![n], &ctx, noon_monday());
        assert_eq!(out.removed_by_url, 1);
        assert_eq!(out.removed_by_device, 0);
        assert!(out.kept.is_empty());
    }

    #[test]
    fn counters_track_each_dimension_independently() {
        let mut by_device = notification("a");
        by_device.target_devices = Some(vec!["mobile".to_string()]);
        let mut by_utm = notification("b");
        by_utm.target_utms = Some(HashMap::from([(
            "utm_source".to_string(),
            Some("ads".to_string()),
        )]));
        let mut by_time = notification("c");
        by_time.active_time_windows = Some(vec![TimeWindow {
            days: vec![3],
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            timezone: "UTC".to_string(),
        }]);
        let kept = notification("d");

        let ctx = RequestContext {
            device: Some("desktop".to_string()),
            utm_source: Some("seo".to_string()),
            ..Default::default()
        };
        let out = apply_targeting(vec![by_device, by_utm, by_time, kept], &ctx, noon_monday());
        assert_eq!(out.removed_by_device, 1);
        assert_eq!(out.removed_by_utm, 1);
        assert_eq!(out.removed_by_time, 1);
        assert_eq!(out.removed_total(), 3);
        assert!(out.targeting_applied());
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.kept[0].id, "d");
    }

    #[test]
    fn device_rule_with_no_context_device_keeps_the_notification() {
        let mut n = notification("a");
        n.target_devices = Some(vec!["mobile".to_string()]);
        let out = apply_targeting(vec![n], &RequestContext::default(), noon_monday());
        assert_eq!(out.kept.len(), 1);
        assert!(!out.targeting_applied());
    }
}
