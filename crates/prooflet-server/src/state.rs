use std::sync::Arc;

use tracing::error;

use prooflet_core::config::Config;
use prooflet_store::{RateCounter, WidgetStore};

use crate::ratelimit::InMemoryRateCounter;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// The server is stateless across requests apart from the rate counter:
/// each selection request independently loads and filters data, so the only
/// shared mutable state is the counter map behind its own lock.
pub struct AppState {
    pub store: Arc<dyn WidgetStore>,
    pub config: Arc<Config>,
    pub rate_counter: Arc<dyn RateCounter>,
}

impl AppState {
    pub fn new(store: impl WidgetStore, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            rate_counter: Arc::new(InMemoryRateCounter::new()),
        }
    }

    /// Check the analytics rate limit for one source IP.
    ///
    /// Returns `true` if the event should be accepted. A counter backend
    /// failure admits the event — losing a little rate-limit precision is
    /// better than dropping real analytics.
    pub async fn allow_event(&self, ip: &str) -> bool {
        match self
            .rate_counter
            .incr(ip, self.config.rate_limit_window_secs)
            .await
        {
            Ok(count) => count <= self.config.rate_limit_max_events,
            Err(e) => {
                error!(ip, error = %e, "rate counter failed; admitting event");
                true
            }
        }
    }
}
