//! HTTP client for the whatsapp-web bridge.
//!
//! All WhatsApp operations go through this client. The bridge owns the
//! puppeteer session and exposes chats, rosters, and message transport over
//! a small HTTP API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::WhatsAppError;

/// HTTP connect timeout for the reqwest client.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for normal operations.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A chat as reported by the bridge. Groups carry their participant roster.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Stable chat identifier (serialized JID).
    pub id: String,
    /// Chat display name.
    pub name: String,
    /// Whether this chat is a group.
    pub is_group: bool,
    /// Group participants; empty for direct chats.
    #[serde(default)]
    pub participants: Vec<ChatParticipant>,
}

/// A group participant as reported by the bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatParticipant {
    /// Full participant JID.
    pub id: String,
    /// Contact name from the address book, if known.
    pub name: Option<String>,
    /// Self-reported push name, if known.
    pub push_name: Option<String>,
}

/// The opaque messaging capability the orchestration core depends on.
///
/// [`BridgeClient`] is the production implementation; tests substitute mocks.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Start (or restart) the QR pairing handshake.
    async fn begin_handshake(&self) -> Result<(), WhatsAppError>;

    /// Fetch the full chat list.
    async fn get_chats(&self) -> Result<Vec<Chat>, WhatsAppError>;

    /// Resolve a single chat by its identifier.
    async fn get_chat_by_id(&self, id: &str) -> Result<Chat, WhatsAppError>;

    /// Send a text message to the given JID.
    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), WhatsAppError>;
}

/// Response envelope from the bridge HTTP API.
#[derive(Deserialize)]
struct BridgeResponse<T> {
    #[allow(dead_code)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Client for the whatsapp-web HTTP bridge.
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: String,
}

impl BridgeClient {
    /// Create a new client pointing at the given base URL.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self { client, base_url }
    }

    /// Returns the base URL of the bridge.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatClient for BridgeClient {
    async fn begin_handshake(&self) -> Result<(), WhatsAppError> {
        let url = format!("{}/connect", self.base_url);
        let resp = self.client.post(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WhatsAppError::HandshakeFailed(format!("{status}: {body}")));
        }
        debug!("handshake started");
        Ok(())
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, WhatsAppError> {
        let url = format!("{}/chats", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let body: BridgeResponse<Vec<Chat>> = resp.json().await?;
        Ok(body.data.unwrap_or_default())
    }

    async fn get_chat_by_id(&self, id: &str) -> Result<Chat, WhatsAppError> {
        let url = format!("{}/chats/{id}", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WhatsAppError::ChatNotFound(id.to_owned()));
        }
        let body: BridgeResponse<Chat> = resp.json().await?;
        body.data
            .ok_or_else(|| WhatsAppError::ChatNotFound(id.to_owned()))
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), WhatsAppError> {
        let url = format!("{}/send", self.base_url);
        let body = serde_json::json!({ "jid": recipient, "text": text });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            warn!(%status, "WhatsApp send failed: {body_text}");
            return Err(WhatsAppError::SendFailed(format!("{status}: {body_text}")));
        }
        debug!(jid = recipient, "message sent via WhatsApp");
        Ok(())
    }
}
