//! Targeting predicate library.
//!
//! Four pure predicates, one per targeting dimension. Each is a total
//! function: parse failures are absorbed internally and resolve to "allow",
//! so callers never need a catch-all around an evaluation. The shared policy
//! is **missing context never blocks** — when the request did not supply the
//! piece of context a rule needs, the predicate returns true, because the
//! server cannot assume absence means mismatch.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;

/// One recurring weekly display window.
///
/// `days` uses Sunday = 0 .. Saturday = 6; empty means every day.
/// `start`/`end` are local "HH:MM" strings in `timezone`, compared
/// lexically and inclusive at both bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub days: Vec<u8>,
    pub start: String,
    pub end: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Compile one glob pattern into an anchored regex: every regex
/// metacharacter is escaped first, then `*` becomes `.*`.
fn compile_glob(pattern: &str) -> Option<Regex> {
    let translated = regex::escape(pattern).replace("\\*", ".*");
    Regex::new(&format!("^{translated}$")).ok()
}

/// URL pattern predicate. `rule` is a comma-separated glob list; the
/// notification passes when ANY pattern matches the context path.
///
/// A pattern that fails to compile is skipped; if no pattern in the rule
/// compiles at all, the rule is treated as absent (never block on a rule
/// the author got wrong). A leading `!` is not special — the pattern text
/// is matched literally (the editor documents `!` as exclusion, but the
/// matcher has never implemented it; see the pinning test below).
pub fn url_patterns_match(rule: Option<&str>, path: Option<&str>) -> bool {
    let patterns: Vec<&str> = match rule {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect(),
        None => return true,
    };
    if patterns.is_empty() {
        return true;
    }
    let Some(path) = path else {
        return true;
    };

    let compiled: Vec<Regex> = patterns.iter().filter_map(|p| compile_glob(p)).collect();
    if compiled.is_empty() {
        return true;
    }
    compiled.iter().any(|re| re.is_match(path))
}

/// Device predicate: case-insensitive membership in the rule's tag set.
pub fn devices_match(rule: Option<&[String]>, device: Option<&str>) -> bool {
    let Some(tags) = rule else {
        return true;
    };
    if tags.is_empty() {
        return true;
    }
    let Some(device) = device else {
        return true;
    };
    tags.iter().any(|t| t.eq_ignore_ascii_case(device))
}

/// UTM predicate: every rule entry with a non-null expected value must equal
/// the context value (AND). Entries with a null expected value mean "any
/// value acceptable" and are skipped.
pub fn utms_match(rule: Option<&HashMap<String, Option<String>>>, ctx: &RequestContext) -> bool {
    let Some(rule) = rule else {
        return true;
    };
    rule.iter().all(|(key, expected)| match expected {
        None => true,
        Some(expected) => ctx.utm(key) == Some(expected.as_str()),
    })
}

/// Time-window predicate: the notification passes when ANY window matches
/// "now". A window with an unparseable timezone fails for itself only, so a
/// rule whose windows are all broken yields false — this is the one predicate
/// that fails closed, because "show outside the configured hours" is worse
/// than "skip this pass".
pub fn time_windows_match(rule: Option<&[TimeWindow]>, now: DateTime<Utc>) -> bool {
    let Some(windows) = rule else {
        return true;
    };
    if windows.is_empty() {
        return true;
    }
    windows.iter().any(|w| window_matches(w, now))
}

fn window_matches(window: &TimeWindow, now: DateTime<Utc>) -> bool {
    let Ok(tz) = window.timezone.parse::<chrono_tz::Tz>() else {
        return false;
    };
    let local = now.with_timezone(&tz);
    let weekday = local.weekday().num_days_from_sunday() as u8;
    if !window.days.is_empty() && !window.days.contains(&weekday) {
        return false;
    }
    let hhmm = local.format("%H:%M").to_string();
    window.start.as_str() <= hhmm.as_str() && hhmm.as_str() <= window.end.as_str()
}
