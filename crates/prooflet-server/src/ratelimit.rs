//! In-process fixed-window rate counter.
//!
//! The analytics endpoint talks to the [`RateCounter`] trait only, so a
//! multi-instance deployment can back it with a shared store (Redis, a
//! database table) without touching the endpoint. This default keeps one
//! map in memory and therefore does not survive restarts — acceptable for
//! abuse damping, which is all the endpoint needs.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;

use prooflet_store::RateCounter;

#[derive(Default)]
pub struct InMemoryRateCounter {
    /// key → (window id, count within that window).
    windows: Mutex<HashMap<String, (u64, u32)>>,
}

impl InMemoryRateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn incr_in_window(&self, key: &str, window_id: u64) -> u32 {
        let mut map = self.windows.lock().await;
        let entry = map.entry(key.to_string()).or_insert((window_id, 0));
        if entry.0 != window_id {
            // A new window resets the count; stale entries are overwritten
            // in place rather than swept.
            *entry = (window_id, 0);
        }
        entry.1 += 1;
        entry.1
    }
}

#[async_trait]
impl RateCounter for InMemoryRateCounter {
    async fn incr(&self, key: &str, window_secs: u64) -> anyhow::Result<u32> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let window_id = now / window_secs.max(1);
        Ok(self.incr_in_window(key, window_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_increment_within_one_window() {
        let counter = InMemoryRateCounter::new();
        assert_eq!(counter.incr_in_window("1.2.3.4", 100).await, 1);
        assert_eq!(counter.incr_in_window("1.2.3.4", 100).await, 2);
        assert_eq!(counter.incr_in_window("1.2.3.4", 100).await, 3);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let counter = InMemoryRateCounter::new();
        assert_eq!(counter.incr_in_window("1.2.3.4", 100).await, 1);
        assert_eq!(counter.incr_in_window("5.6.7.8", 100).await, 1);
    }

    #[tokio::test]
    async fn a_new_window_resets_the_count() {
        let counter = InMemoryRateCounter::new();
        for _ in 0..5 {
            counter.incr_in_window("1.2.3.4", 100).await;
        }
        assert_eq!(counter.incr_in_window("1.2.3.4", 101).await, 1);
    }
}
