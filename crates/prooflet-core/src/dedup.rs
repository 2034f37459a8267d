//! Deduplication filter.
//!
//! Widgets accumulate near-identical notifications (imports run twice, a
//! "duplicate" click followed by no edits). Entries that would render
//! identically are collapsed before targeting runs, keeping the first
//! occurrence in input order.

use std::collections::HashSet;

use crate::notification::{Notification, NotificationType};

/// The fields that determine what the visitor actually sees. Two
/// notifications with equal keys are indistinguishable on screen.
///
/// A structural key rather than a joined string: a literal separator
/// character inside a message can never collide with field boundaries.
#[derive(Debug, PartialEq, Eq, Hash)]
struct RenderKey {
    notification_type: NotificationType,
    message: String,
    name: String,
    location: String,
    product_name: String,
    rating: Option<u8>,
    visitor_count: Option<i64>,
    stock_count: Option<i64>,
    milestone_text: String,
}

impl RenderKey {
    fn of(n: &Notification) -> Self {
        Self {
            notification_type: n.notification_type,
            message: n.message.clone().unwrap_or_default(),
            name: n.name.clone().unwrap_or_default(),
            location: n.location.clone().unwrap_or_default(),
            product_name: n.product_name.clone().unwrap_or_default(),
            rating: n.rating,
            visitor_count: n.visitor_count,
            stock_count: n.stock_count,
            milestone_text: n.milestone_text.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
pub struct DedupOutcome {
    pub kept: Vec<Notification>,
    pub removed: usize,
}

/// Keep the first notification with each render key, preserving relative
/// order of the kept items. Idempotent: running the filter on its own output
/// removes nothing further.
pub fn dedup_notifications(input: Vec<Notification>) -> DedupOutcome {
    let mut seen: HashSet<RenderKey> = HashSet::with_capacity(input.len());
    let mut kept = Vec::with_capacity(input.len());
    let mut removed = 0;

    for n in input {
        if seen.insert(RenderKey::of(&n)) {
            kept.push(n);
        } else {
            removed += 1;
        }
    }

    DedupOutcome { kept, removed }
}
