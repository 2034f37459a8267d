//! Prooflet embed runtime.
//!
//! The delivery loop that runs on the visitor's side of the fence: fetch the
//! selection payload with bounded retries, cycle eligible notifications on a
//! fixed cadence, and report impressions/clicks without ever blocking or
//! surfacing an error to the visitor. Rendering and event transport are
//! behind the [`Surface`](controller::Surface) and [`EventSink`](sink::EventSink)
//! traits so hosts with different display layers reuse the same cycle, and
//! tests drive it without a wall clock.

pub mod controller;
pub mod fetch;
pub mod sink;

use std::sync::Arc;

use controller::{DeliveryController, DisplayOverrides, Surface};
use fetch::{fetch_selection, FetchConfig};
use sink::HttpEventSink;

/// Options carried by the embed snippet: the widget identity plus any
/// display-override attributes the host page set on the script tag.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Server origin, e.g. "https://notify.example.com".
    pub base_url: String,
    pub widget_id: String,
    /// The page URL reported with analytics events.
    pub page_url: Option<String>,
    pub overrides: DisplayOverrides,
}

/// Self-initialisation entry point: fetch the payload and run the cycle to
/// completion. Returns quietly on fetch failure or an empty selection — the
/// host page never sees an error from here.
pub async fn start<S: Surface>(options: EmbedOptions, surface: S) {
    let client = reqwest::Client::new();
    let endpoint = format!(
        "{}/widget/{}",
        options.base_url.trim_end_matches('/'),
        options.widget_id
    );
    let Some(payload) = fetch_selection(&client, &endpoint, &FetchConfig::default()).await else {
        return;
    };

    let sink = Arc::new(HttpEventSink::new(
        client,
        format!("{}/analytics", options.base_url.trim_end_matches('/')),
    ));
    let mut controller = DeliveryController::new(
        options.widget_id,
        payload,
        options.overrides,
        surface,
        sink,
        options.page_url,
    );
    controller.run().await;
}
