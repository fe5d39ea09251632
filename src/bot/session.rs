//! WhatsApp session lifecycle.
//!
//! The [`SessionManager`] owns the single client handle and drives the
//! state machine `Uninitialized → AwaitingScan → Connected → Disconnected`.
//! Lifecycle events arrive on an mpsc channel from the bridge listener;
//! every disconnect schedules exactly one deferred reconnect attempt, which
//! a manual [`connect`](SessionManager::connect) call preempts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::BotError;
use crate::whatsapp::{Chat, ChatClient, ClientFactory, SessionEvent};

/// Delay before the automatic reconnect attempt after a disconnect.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Lifecycle state of the WhatsApp session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No client handle exists yet.
    #[default]
    Uninitialized,
    /// Handshake in progress; a QR challenge may be pending.
    AwaitingScan,
    /// Authenticated and ready for directory and send operations.
    Connected,
    /// Connection lost; a deferred reconnect is pending.
    Disconnected,
}

/// Point-in-time view of the session.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Current lifecycle state.
    pub state: SessionState,
    /// Pending QR payload, present only while awaiting a scan.
    pub qr: Option<String>,
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    qr: Option<String>,
    client: Option<Arc<dyn ChatClient>>,
    pump: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

impl Inner {
    fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            qr: self.qr.clone(),
        }
    }
}

/// Owns the single WhatsApp session for the whole process.
///
/// The underlying client handle is never exposed; collaborators go through
/// the checked [`get_chats`](Self::get_chats),
/// [`get_chat_by_id`](Self::get_chat_by_id), and
/// [`send_message`](Self::send_message) methods, which fail with
/// [`BotError::SessionNotReady`] unless the session is `Connected`.
pub struct SessionManager {
    factory: Arc<dyn ClientFactory>,
    inner: Mutex<Inner>,
}

impl SessionManager {
    /// Create a manager that builds client handles from the given factory.
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Side-effect-free read of the current state and pending QR payload.
    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status()
    }

    /// Drive the session toward `Connected`.
    ///
    /// - While `Connected`, returns the current status with no side effects.
    /// - While `AwaitingScan`, returns the pending QR payload (if any)
    ///   without restarting the handshake — polling this endpoint is
    ///   idempotent, and only one handshake is ever in flight.
    /// - Otherwise destroys any stale client handle, cancels a pending
    ///   reconnect, constructs a fresh client, and starts its handshake.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Bridge`] if a fresh handshake cannot be started;
    /// the session is left `Disconnected` in that case.
    pub async fn connect(self: &Arc<Self>) -> Result<SessionStatus, BotError> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SessionState::Connected | SessionState::AwaitingScan => Ok(inner.status()),
            SessionState::Uninitialized | SessionState::Disconnected => {
                if let Some(handle) = inner.reconnect.take() {
                    handle.abort();
                }
                if let Some(handle) = inner.pump.take() {
                    handle.abort();
                }
                inner.client = None;
                inner.qr = None;

                let (client, events) = self.factory.create();
                inner.pump = Some(self.spawn_event_pump(events));
                inner.client = Some(Arc::clone(&client));

                info!("starting WhatsApp handshake");
                match client.begin_handshake().await {
                    Ok(()) => {
                        inner.state = SessionState::AwaitingScan;
                        Ok(inner.status())
                    }
                    Err(e) => {
                        warn!(error = %e, "handshake could not be started");
                        inner.state = SessionState::Disconnected;
                        Err(e.into())
                    }
                }
            }
        }
    }

    /// Fetch the full chat list. Requires `Connected`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::SessionNotReady`] if the session is not connected,
    /// or [`BotError::Bridge`] if the bridge call fails.
    pub async fn get_chats(&self) -> Result<Vec<Chat>, BotError> {
        let client = self.connected_client().await?;
        Ok(client.get_chats().await?)
    }

    /// Resolve a chat by id. Requires `Connected`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::SessionNotReady`] if the session is not connected,
    /// or [`BotError::Bridge`] if the bridge call fails (including
    /// [`crate::whatsapp::WhatsAppError::ChatNotFound`] for unknown ids).
    pub async fn get_chat_by_id(&self, id: &str) -> Result<Chat, BotError> {
        let client = self.connected_client().await?;
        Ok(client.get_chat_by_id(id).await?)
    }

    /// Send a text message. Requires `Connected`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::SessionNotReady`] if the session is not connected,
    /// or [`BotError::Bridge`] if the send is rejected.
    pub async fn send_message(&self, recipient: &str, text: &str) -> Result<(), BotError> {
        let client = self.connected_client().await?;
        Ok(client.send_message(recipient, text).await?)
    }

    async fn connected_client(&self) -> Result<Arc<dyn ChatClient>, BotError> {
        let inner = self.inner.lock().await;
        if inner.state != SessionState::Connected {
            return Err(BotError::SessionNotReady);
        }
        inner
            .client
            .as_ref()
            .map(Arc::clone)
            .ok_or(BotError::SessionNotReady)
    }

    fn spawn_event_pump(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(manager) = weak.upgrade() else {
                    return;
                };
                manager.apply_event(event).await;
            }
        })
    }

    async fn apply_event(self: &Arc<Self>, event: SessionEvent) {
        let mut inner = self.inner.lock().await;
        match event {
            SessionEvent::Qr { payload } => {
                info!("QR challenge received");
                inner.qr = Some(payload);
                if inner.state != SessionState::Connected {
                    inner.state = SessionState::AwaitingScan;
                }
            }
            SessionEvent::Ready => {
                info!("WhatsApp session ready");
                inner.state = SessionState::Connected;
                inner.qr = None;
                if let Some(handle) = inner.reconnect.take() {
                    handle.abort();
                }
            }
            SessionEvent::Disconnected { reason } => {
                warn!(reason = reason.as_deref().unwrap_or("unknown"), "WhatsApp disconnected");
                inner.state = SessionState::Disconnected;
                inner.qr = None;
                inner.reconnect = Some(self.schedule_reconnect());
            }
        }
    }

    /// Schedule the one-shot reconnect attempt. Retries are unbounded with
    /// a fixed delay; each disconnect event schedules exactly one attempt.
    fn schedule_reconnect(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(RECONNECT_DELAY).await;
            let Some(manager) = weak.upgrade() else {
                return;
            };
            manager.retry_handshake().await;
        })
    }

    /// Re-invoke the handshake on the existing client after a disconnect.
    async fn retry_handshake(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Disconnected {
            debug!(state = ?inner.state, "reconnect preempted, skipping");
            return;
        }
        let Some(client) = inner.client.as_ref().map(Arc::clone) else {
            return;
        };
        info!("reconnecting WhatsApp session");
        match client.begin_handshake().await {
            Ok(()) => inner.state = SessionState::AwaitingScan,
            Err(e) => warn!(error = %e, "reconnect handshake failed"),
        }
    }
}
