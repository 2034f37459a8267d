//! The delivery cycle, as an explicit state machine.
//!
//! One controller instance owns the cycling state for one embedded widget —
//! several widgets on one page get independent controllers that cannot
//! interfere. Each transition schedules exactly one timer, so the whole
//! cycle is auditable and, with tokio's paused clock, testable without
//! wall-clock waits.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::debug;

use prooflet_core::event::AnalyticsEventType;
use prooflet_core::notification::NotificationView;
use prooflet_core::widget::DisplaySettings;

use crate::fetch::SelectionPayload;
use crate::sink::{EventSink, OutgoingEvent};

/// Where the cycle currently is:
///
/// ```text
/// (fetch) → Empty | Cycling → Showing ⇄ Hidden → … → Stopped
/// ```
///
/// `Stopped` is only reached with `loop = false`, after one full pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Cycling,
    Showing,
    Hidden,
    Stopped,
}

/// The display layer the controller drives.
///
/// Implementations must tolerate being called after their underlying target
/// has gone away (a navigated-away page, a torn-down test harness): return
/// an error from `show` and the controller skips that notification instead
/// of crashing the cycle.
pub trait Surface: Send {
    fn show(&mut self, notification: &NotificationView, settings: &DisplaySettings)
        -> anyhow::Result<()>;
    fn hide(&mut self);
}

/// Display-override attributes from the embed snippet's script tag. Any
/// field set here wins over the server-resolved settings.
#[derive(Debug, Clone, Default)]
pub struct DisplayOverrides {
    pub color: Option<String>,
    pub radius: Option<u32>,
    pub shadow: Option<String>,
    pub animation: Option<String>,
}

impl DisplayOverrides {
    fn apply(&self, mut settings: DisplaySettings) -> DisplaySettings {
        if let Some(color) = &self.color {
            settings.color = color.clone();
        }
        if let Some(radius) = self.radius {
            settings.radius = radius;
        }
        if let Some(shadow) = &self.shadow {
            settings.shadow = shadow.clone();
        }
        if let Some(animation) = &self.animation {
            settings.animation = animation.clone();
        }
        settings
    }
}

pub struct DeliveryController<S: Surface, E: EventSink> {
    widget_id: String,
    settings: DisplaySettings,
    queue: Vec<NotificationView>,
    index: usize,
    /// Advances taken in the current pass, shown or skipped. A pass is
    /// complete when this reaches the queue length.
    steps: usize,
    /// Re-entrancy guard: only one notification may be visible at a time,
    /// however timers race.
    is_showing: bool,
    phase: Phase,
    surface: S,
    sink: Arc<E>,
    page_url: Option<String>,
}

impl<S: Surface, E: EventSink> DeliveryController<S, E> {
    pub fn new(
        widget_id: String,
        payload: SelectionPayload,
        overrides: DisplayOverrides,
        surface: S,
        sink: Arc<E>,
        page_url: Option<String>,
    ) -> Self {
        let settings = overrides.apply(payload.widget);
        let mut queue = payload.notifications;
        if settings.shuffle {
            queue.shuffle(&mut rand::thread_rng());
        }
        let phase = if queue.is_empty() {
            Phase::Empty
        } else {
            Phase::Cycling
        };
        Self {
            widget_id,
            settings,
            queue,
            index: 0,
            steps: 0,
            is_showing: false,
            phase,
            surface,
            sink,
            page_url,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    fn record(&self, event_type: AnalyticsEventType, notification_id: &str) {
        self.sink.record(OutgoingEvent {
            widget_id: self.widget_id.clone(),
            event_type,
            notification_id: Some(notification_id.to_string()),
            url: self.page_url.clone(),
        });
    }

    fn advance(&mut self) {
        self.steps += 1;
        self.index = (self.index + 1) % self.queue.len();
    }

    fn pass_complete(&self) -> bool {
        self.steps >= self.queue.len()
    }

    /// Cycling → Showing. Renders the current notification and fires the
    /// impression event, fire-and-forget.
    ///
    /// Returns false without touching the surface when a notification is
    /// already visible (the single-flight guard), and swallows a surface
    /// failure by skipping to the next index — a stale display target must
    /// not end the cycle.
    pub fn show_next(&mut self) -> bool {
        if self.is_showing {
            return false;
        }
        let Some(notification) = self.queue.get(self.index) else {
            return false;
        };
        let id = notification.id.clone();
        match self.surface.show(notification, &self.settings) {
            Ok(()) => {
                self.is_showing = true;
                self.phase = Phase::Showing;
                self.record(AnalyticsEventType::Impression, &id);
                true
            }
            Err(e) => {
                debug!(notification_id = %id, error = %e, "surface rejected show; skipping");
                self.advance();
                false
            }
        }
    }

    /// Showing → Hidden. Tears the popup down and advances the index.
    pub fn hide_current(&mut self) {
        if !self.is_showing {
            return;
        }
        self.surface.hide();
        self.is_showing = false;
        self.phase = Phase::Hidden;
        self.advance();
    }

    /// A click on the visible popup: fires the click event without waiting
    /// on it and hands back the target URL so navigation proceeds
    /// immediately.
    pub fn handle_click(&self) -> Option<String> {
        if !self.is_showing {
            return None;
        }
        let notification = self.queue.get(self.index)?;
        self.record(AnalyticsEventType::Click, &notification.id);
        notification.click_url.clone()
    }

    /// Drive the cycle to completion.
    ///
    /// With `loop = true` this runs until the task is dropped (page unload
    /// kills every pending timer implicitly); with `loop = false` it returns
    /// after one full pass, in [`Phase::Stopped`].
    pub async fn run(&mut self) {
        if self.phase != Phase::Cycling {
            return;
        }
        tokio::time::sleep(secs(self.settings.start_delay)).await;
        loop {
            if self.show_next() {
                tokio::time::sleep(secs(self.settings.duration)).await;
                self.hide_current();
            }
            if self.pass_complete() {
                if !self.settings.loop_enabled {
                    self.phase = Phase::Stopped;
                    return;
                }
                self.steps = 0;
            }
            tokio::time::sleep(secs(self.settings.gap)).await;
        }
    }
}

fn secs(value: u32) -> Duration {
    Duration::from_secs(u64::from(value))
}
