//! Selection orchestrator.
//!
//! One request in, one payload out: load the widget and its active
//! notifications, build the visitor context, dedup, target, clamp, and
//! assemble the response the embed runtime renders from. Stateless across
//! requests — every invocation loads and filters independently.

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use prooflet_core::context::RequestContext;
use prooflet_core::dedup::dedup_notifications;
use prooflet_core::notification::NotificationView;
use prooflet_core::pipeline::apply_targeting;
use prooflet_core::targeting;
use prooflet_core::widget::{DisplaySettings, Widget};
use prooflet_store::WidgetStore;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub limit: Option<i64>,
    pub ctx_path: Option<String>,
    pub ctx_device: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

/// Diagnostics block returned alongside the eligible notifications.
#[derive(Debug, Serialize)]
pub struct SelectionMeta {
    pub total_loaded: usize,
    pub dedup_removed: usize,
    pub filtered_removed: usize,
    pub targeting_applied: bool,
    /// Advisory referrer-vs-widget-domain comparison. Never enforced.
    pub domain_ok: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub widget: DisplaySettings,
    pub notifications: Vec<NotificationView>,
    pub meta: SelectionMeta,
}

/// Clamp the caller-supplied limit to `(0, max]`; zero, negative, or absent
/// values fall back to the configured default.
pub fn clamp_limit(requested: Option<i64>, default: u32, max: u32) -> u32 {
    match requested {
        Some(v) if v > 0 => u32::try_from(v).unwrap_or(max).min(max),
        _ => default.min(max),
    }
}

/// Map a User-Agent string to our device tags via `woothee`:
/// "pc" → "desktop", "smartphone"/"mobilephone" → "mobile",
/// "tablet" → "tablet", anything else → "desktop".
pub fn device_from_user_agent(user_agent: &str) -> Option<String> {
    if user_agent.is_empty() {
        return None;
    }
    let result = woothee::parser::Parser::new().parse(user_agent)?;
    let device = match result.category {
        "smartphone" | "mobilephone" => "mobile",
        "tablet" => "tablet",
        _ => "desktop",
    };
    Some(device.to_string())
}

/// Build the per-request context from query parameters and headers.
///
/// `ctx_device` wins when the embed sent it; otherwise the User-Agent header
/// is classified. Referrer prefers `Referer` and falls back to `Origin`.
pub fn build_context(query: &SelectionQuery, headers: &HeaderMap) -> RequestContext {
    let header_str = |name: axum::http::header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let device = query.ctx_device.clone().or_else(|| {
        headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .and_then(device_from_user_agent)
    });
    RequestContext {
        path: query.ctx_path.clone(),
        device,
        utm_source: query.utm_source.clone(),
        utm_medium: query.utm_medium.clone(),
        utm_campaign: query.utm_campaign.clone(),
        utm_term: query.utm_term.clone(),
        utm_content: query.utm_content.clone(),
        referrer: header_str(axum::http::header::REFERER)
            .or_else(|| header_str(axum::http::header::ORIGIN)),
    }
}

/// Extract a lowercased hostname with any leading `www.` removed.
/// Returns `None` when no host can be found — callers treat that as
/// "cannot judge", not as a mismatch.
fn host_of(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let host = match url::Url::parse(trimmed) {
        Ok(parsed) => parsed.host_str()?.to_string(),
        // Bare domains ("example.com", "www.shop.example.com/checkout")
        // don't parse as absolute URLs; strip by hand.
        Err(_) => trimmed
            .split("://")
            .last()?
            .split('/')
            .next()?
            .to_string(),
    };
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Advisory domain check: does the request referrer belong to the widget's
/// declared domain? Suffix match on hostname labels, so `shop.example.com`
/// passes a widget registered for `example.com`. Any parse failure — either
/// side — defaults to allowed.
pub fn domain_allowed(widget_domain: Option<&str>, referrer: Option<&str>) -> bool {
    let (Some(domain), Some(referrer)) = (widget_domain, referrer) else {
        return true;
    };
    let Some(expected) = host_of(domain) else {
        return true;
    };
    let Some(actual) = host_of(referrer) else {
        return true;
    };
    actual == expected || actual.ends_with(&format!(".{expected}"))
}

/// Widget-level targeting gate: when the widget itself carries URL or
/// device rules, a non-matching request gets the widget's display settings
/// but no notifications. Same predicates, same fail-open posture; the
/// blocking dimension (URL checked first) claims the removals.
fn widget_gate(
    widget: &Widget,
    ctx: &RequestContext,
    dropped: usize,
) -> Option<prooflet_core::pipeline::TargetingOutcome> {
    let mut outcome = prooflet_core::pipeline::TargetingOutcome::default();
    if !targeting::url_patterns_match(widget.target_url_patterns.as_deref(), ctx.path.as_deref()) {
        outcome.removed_by_url = dropped;
        return Some(outcome);
    }
    if !targeting::devices_match(widget.target_devices.as_deref(), ctx.device.as_deref()) {
        outcome.removed_by_device = dropped;
        return Some(outcome);
    }
    None
}

/// The whole selection pipeline for one request.
pub async fn select_notifications(
    state: &AppState,
    widget_id: &str,
    query: &SelectionQuery,
    headers: &HeaderMap,
) -> Result<SelectionResponse, AppError> {
    if uuid::Uuid::parse_str(widget_id).is_err() {
        return Err(AppError::InvalidWidgetId);
    }

    let widget = state
        .store
        .get_widget(widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    let limit = clamp_limit(
        query.limit,
        state.config.default_selection_limit,
        state.config.max_selection_limit,
    );
    let loaded = state.store.list_active_notifications(widget_id, limit).await?;
    let total_loaded = loaded.len();

    let ctx = build_context(query, headers);
    let domain_ok = domain_allowed(widget.domain.as_deref(), ctx.referrer.as_deref());

    let deduped = dedup_notifications(loaded);
    let dedup_removed = deduped.removed;

    // A widget-level rule miss drops every remaining notification in one go;
    // otherwise the per-notification pipeline runs.
    let targeted = match widget_gate(&widget, &ctx, deduped.kept.len()) {
        Some(blocked) => blocked,
        None => apply_targeting(deduped.kept, &ctx, Utc::now()),
    };

    if targeted.targeting_applied() {
        tracing::debug!(
            widget_id,
            removed_by_url = targeted.removed_by_url,
            removed_by_device = targeted.removed_by_device,
            removed_by_utm = targeted.removed_by_utm,
            removed_by_time = targeted.removed_by_time,
            "targeting removed notifications"
        );
    }

    Ok(SelectionResponse {
        widget: DisplaySettings::from_widget(&widget),
        notifications: targeted
            .kept
            .iter()
            .map(NotificationView::from_notification)
            .collect(),
        meta: SelectionMeta {
            total_loaded,
            dedup_removed,
            filtered_removed: targeted.removed_total(),
            targeting_applied: targeted.targeting_applied(),
            domain_ok,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamps_to_the_ceiling() {
        assert_eq!(clamp_limit(Some(999), 15, 50), 50);
        assert_eq!(clamp_limit(Some(50), 15, 50), 50);
        assert_eq!(clamp_limit(Some(20), 15, 50), 20);
    }

    #[test]
    fn nonpositive_or_missing_limit_falls_back_to_default() {
        assert_eq!(clamp_limit(Some(0), 15, 50), 15);
        assert_eq!(clamp_limit(Some(-5), 15, 50), 15);
        assert_eq!(clamp_limit(None, 15, 50), 15);
    }

    #[test]
    fn domain_check_passes_without_both_sides() {
        assert!(domain_allowed(None, Some("https://example.com/")));
        assert!(domain_allowed(Some("example.com"), None));
        assert!(domain_allowed(None, None));
    }

    #[test]
    fn domain_check_normalizes_scheme_and_www() {
        assert!(domain_allowed(
            Some("https://www.example.com"),
            Some("https://example.com/pricing")
        ));
        assert!(domain_allowed(
            Some("example.com"),
            Some("https://www.example.com/")
        ));
    }

    #[test]
    fn subdomains_pass_the_suffix_match() {
        assert!(domain_allowed(
            Some("example.com"),
            Some("https://shop.example.com/cart")
        ));
        // Suffix match respects label boundaries.
        assert!(!domain_allowed(
            Some("example.com"),
            Some("https://notexample.com/")
        ));
    }

    #[test]
    fn mismatched_domain_is_flagged() {
        assert!(!domain_allowed(
            Some("example.com"),
            Some("https://other.org/")
        ));
    }

    #[test]
    fn unparseable_referrer_defaults_to_allowed() {
        assert!(domain_allowed(Some("example.com"), Some("   ")));
    }

    #[test]
    fn empty_user_agent_yields_no_device() {
        assert_eq!(device_from_user_agent(""), None);
    }

    #[test]
    fn desktop_chrome_classifies_as_desktop() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(device_from_user_agent(ua).as_deref(), Some("desktop"));
    }
}
