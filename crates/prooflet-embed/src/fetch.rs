//! Selection payload fetch with bounded retry.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use prooflet_core::notification::NotificationView;
use prooflet_core::widget::DisplaySettings;

/// What the embed needs from the selection response. `meta` is diagnostics
/// for the dashboard and is ignored here.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionPayload {
    pub widget: DisplaySettings,
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Guard on each individual attempt, on top of reqwest's own connect
    /// timeout, so one hung response cannot stall the loop indefinitely.
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Fetch the selection payload, retrying up to `config.attempts` times.
///
/// Returns `None` after the attempts are exhausted — the caller gives up
/// permanently and shows nothing. No error ever propagates past here.
pub async fn fetch_selection(
    client: &reqwest::Client,
    endpoint: &str,
    config: &FetchConfig,
) -> Option<SelectionPayload> {
    for attempt in 1..=config.attempts.max(1) {
        match attempt_fetch(client, endpoint, config.request_timeout).await {
            Ok(payload) => return Some(payload),
            Err(reason) => {
                debug!(endpoint, attempt, %reason, "selection fetch attempt failed");
            }
        }
        if attempt < config.attempts {
            tokio::time::sleep(config.backoff).await;
        }
    }
    None
}

async fn attempt_fetch(
    client: &reqwest::Client,
    endpoint: &str,
    request_timeout: Duration,
) -> Result<SelectionPayload, String> {
    let response = tokio::time::timeout(request_timeout, client.get(endpoint).send())
        .await
        .map_err(|_| "timed out".to_string())?
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("status {}", response.status()));
    }
    response
        .json::<SelectionPayload>()
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn quick_config() -> FetchConfig {
        FetchConfig {
            attempts: 3,
            backoff: Duration::from_millis(10),
            request_timeout: Duration::from_secs(2),
        }
    }

    /// Accept connections and drop them immediately, counting each one.
    async fn broken_server(counter: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });
        format!("http://{addr}/widget/w1")
    }

    /// Serve one canned HTTP response per connection.
    async fn canned_server(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let body = body.clone();
                tokio::spawn(async move {
                    // Drain the request head before answering.
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}/widget/w1")
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let endpoint = broken_server(Arc::clone(&counter)).await;
        let client = reqwest::Client::new();
        let result = fetch_selection(&client, &endpoint, &quick_config()).await;
        assert!(result.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 3, "one connection per attempt");
    }

    #[tokio::test]
    async fn parses_a_successful_response() {
        let body = serde_json::json!({
            "widget": {
                "id": "w1",
                "position": "bottom-left",
                "color": "#333333",
                "radius": 14,
                "shadow": "medium",
                "animation": "standard",
                "duration": 6,
                "gap": 2,
                "start_delay": 2,
                "loop": true,
                "shuffle": false,
                "bg_color": "#FFFFFF",
                "bg_opacity": 100
            },
            "notifications": [],
            "meta": { "total_loaded": 0 }
        })
        .to_string();
        let endpoint = canned_server(body).await;
        let client = reqwest::Client::new();
        let payload = fetch_selection(&client, &endpoint, &quick_config())
            .await
            .expect("payload");
        assert_eq!(payload.widget.id, "w1");
        assert!(payload.widget.loop_enabled);
        assert!(payload.notifications.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_counts_as_a_failed_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                        .await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        let client = reqwest::Client::new();
        let result = fetch_selection(
            &client,
            &format!("http://{addr}/widget/missing"),
            &quick_config(),
        )
        .await;
        assert!(result.is_none());
    }
}
