//! WhatsApp adapter: HTTP bridge client and event listener.
//!
//! The actual protocol work (QR pairing, message transport, chat retrieval)
//! lives in an external whatsapp-web bridge process. This module consumes it
//! as an opaque capability: the [`ChatClient`] trait plus a stream of
//! [`events::SessionEvent`] lifecycle notifications.

pub mod client;
pub mod events;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use client::{BridgeClient, Chat, ChatClient, ChatParticipant};
pub use events::SessionEvent;

/// Errors from the WhatsApp adapter.
#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    /// HTTP request to the bridge failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge rejected a handshake request.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The requested chat could not be resolved.
    #[error("chat not found: {0}")]
    ChatNotFound(String),

    /// The bridge rejected an outbound message.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Constructs a fresh client handle and its lifecycle event stream.
///
/// The session manager destroys and recreates the underlying client on
/// reconnect; each [`create`](ClientFactory::create) call must yield an
/// independent handle whose events flow into the returned receiver.
pub trait ClientFactory: Send + Sync {
    /// Create a new client and the receiver for its lifecycle events.
    fn create(&self) -> (Arc<dyn ChatClient>, mpsc::Receiver<SessionEvent>);
}

/// Factory producing [`BridgeClient`] handles against a fixed bridge URL.
pub struct BridgeClientFactory {
    base_url: String,
}

impl BridgeClientFactory {
    /// Create a factory pointing at the given bridge base URL.
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

impl ClientFactory for BridgeClientFactory {
    fn create(&self) -> (Arc<dyn ChatClient>, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(32);
        events::spawn_event_listener(self.base_url.clone(), tx);
        (Arc::new(BridgeClient::new(self.base_url.clone())), rx)
    }
}
