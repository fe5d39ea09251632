//! Event listener for WhatsApp session lifecycle notifications.
//!
//! Long-polls the bridge's `/events/poll` endpoint and forwards QR, ready,
//! and disconnect events to the session manager via an mpsc channel.

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A session lifecycle event from the bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionEvent {
    /// A QR pairing challenge was issued. The payload is opaque; rendering
    /// it as a scannable image is the frontend's job.
    Qr {
        /// Opaque QR payload.
        payload: String,
    },
    /// The session is authenticated and ready.
    Ready,
    /// The session was disconnected.
    Disconnected {
        /// Human-readable reason, if available.
        reason: Option<String>,
    },
}

/// Long-poll timeout for the HTTP client (seconds).
const POLL_TIMEOUT_SECS: u64 = 60;

/// Maximum listener reconnect backoff (milliseconds).
const MAX_BACKOFF_MS: u64 = 30_000;

/// Spawn an event listener that forwards bridge events to the given channel.
///
/// Returns immediately. The listener runs as a background Tokio task and
/// reconnects to the bridge automatically with exponential backoff. It exits
/// once the receiving side of the channel is dropped.
pub fn spawn_event_listener(
    base_url: String,
    event_tx: mpsc::Sender<SessionEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let poll_url = format!("{base_url}/events/poll");
        let mut backoff_ms: u64 = 1000;

        loop {
            info!(url = %poll_url, "connecting to WhatsApp event stream");

            match poll_events(&poll_url, &event_tx).await {
                Ok(()) => {
                    info!("WhatsApp event stream closed normally");
                    break;
                }
                Err(e) => {
                    if event_tx.is_closed() {
                        break;
                    }
                    warn!(error = %e, backoff_ms, "WhatsApp event stream error, reconnecting");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                    backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                }
            }
        }
    })
}

/// Poll the bridge for events in a loop. Returns `Err` on non-timeout
/// network errors so the caller can reconnect with backoff.
async fn poll_events(
    poll_url: &str,
    event_tx: &mpsc::Sender<SessionEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS))
        .build()?;

    loop {
        match client.get(poll_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                if let Ok(events) = resp.json::<Vec<SessionEvent>>().await {
                    for event in events {
                        debug!(?event, "received WhatsApp event");
                        if event_tx.send(event).await.is_err() {
                            // Receiver dropped — shut down cleanly.
                            return Ok(());
                        }
                    }
                }
            }
            Ok(resp) => {
                debug!(status = %resp.status(), "event poll returned non-200");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
            Err(e) if e.is_timeout() => {
                // Normal: long-poll timeout expired, just retry immediately.
                continue;
            }
            Err(e) => {
                return Err(e.into());
            }
        }
    }
}
