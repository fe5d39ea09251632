//! Shared test doubles for the WhatsApp bridge.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use pushkontak::bot::session::{SessionManager, SessionState};
use pushkontak::whatsapp::{
    Chat, ChatClient, ChatParticipant, ClientFactory, SessionEvent, WhatsAppError,
};

/// A successfully delivered message, with its delivery time.
pub struct SentMessage {
    pub jid: String,
    pub text: String,
    pub at: tokio::time::Instant,
}

/// Scripted bridge client: serves a fixed chat list, refuses sends to
/// configured JIDs, and records every attempt.
pub struct MockClient {
    chats: Vec<Chat>,
    fail_jids: HashSet<String>,
    handshakes: AtomicUsize,
    attempts: Mutex<Vec<String>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MockClient {
    pub fn new(chats: Vec<Chat>) -> Self {
        Self::failing(chats, &[])
    }

    pub fn failing(chats: Vec<Chat>, fail_jids: &[&str]) -> Self {
        Self {
            chats,
            fail_jids: fail_jids.iter().map(|j| (*j).to_owned()).collect(),
            handshakes: AtomicUsize::new(0),
            attempts: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn handshake_count(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    /// Every JID a send was attempted for, in order.
    pub fn attempted_jids(&self) -> Vec<String> {
        self.attempts.lock().expect("attempts lock").clone()
    }

    /// JIDs of successful sends, in order.
    pub fn sent_jids(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(|m| m.jid.clone())
            .collect()
    }

    /// Delivery instants of successful sends, in order.
    pub fn sent_times(&self) -> Vec<tokio::time::Instant> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(|m| m.at)
            .collect()
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn begin_handshake(&self) -> Result<(), WhatsAppError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, WhatsAppError> {
        Ok(self.chats.clone())
    }

    async fn get_chat_by_id(&self, id: &str) -> Result<Chat, WhatsAppError> {
        self.chats
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| WhatsAppError::ChatNotFound(id.to_owned()))
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), WhatsAppError> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .push(recipient.to_owned());
        if self.fail_jids.contains(recipient) {
            return Err(WhatsAppError::SendFailed("scripted refusal".to_owned()));
        }
        self.sent.lock().expect("sent lock").push(SentMessage {
            jid: recipient.to_owned(),
            text: text.to_owned(),
            at: tokio::time::Instant::now(),
        });
        Ok(())
    }
}

/// Factory handing out the same [`MockClient`] and keeping the sender side
/// of each created event channel so tests can fire lifecycle events.
pub struct MockFactory {
    client: Arc<MockClient>,
    event_txs: Mutex<Vec<mpsc::Sender<SessionEvent>>>,
}

impl MockFactory {
    pub fn new(client: Arc<MockClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            event_txs: Mutex::new(Vec::new()),
        })
    }

    /// How many client handles were created.
    pub fn created_count(&self) -> usize {
        self.event_txs.lock().expect("tx lock").len()
    }

    /// Fire a lifecycle event into the most recently created client.
    pub async fn emit(&self, event: SessionEvent) {
        let tx = self
            .event_txs
            .lock()
            .expect("tx lock")
            .last()
            .cloned()
            .expect("no client created yet");
        tx.send(event).await.expect("event channel closed");
    }
}

impl ClientFactory for MockFactory {
    fn create(&self) -> (Arc<dyn ChatClient>, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(8);
        self.event_txs.lock().expect("tx lock").push(tx);
        (Arc::clone(&self.client) as Arc<dyn ChatClient>, rx)
    }
}

/// Build a group chat fixture. Members are `(jid, contact_name, push_name)`.
pub fn group(id: &str, name: &str, members: &[(&str, Option<&str>, Option<&str>)]) -> Chat {
    Chat {
        id: id.to_owned(),
        name: name.to_owned(),
        is_group: true,
        participants: members
            .iter()
            .map(|(jid, contact, push)| ChatParticipant {
                id: (*jid).to_owned(),
                name: contact.map(str::to_owned),
                push_name: push.map(str::to_owned),
            })
            .collect(),
    }
}

/// Build a direct (non-group) chat fixture.
pub fn direct_chat(id: &str, name: &str) -> Chat {
    Chat {
        id: id.to_owned(),
        name: name.to_owned(),
        is_group: false,
        participants: Vec::new(),
    }
}

/// Let spawned tasks (event pump, reconnect) run. Under a paused clock the
/// sleep advances instantly.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

/// Session manager wired to the given factory.
pub fn manager_with(factory: &Arc<MockFactory>) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        Arc::clone(factory) as Arc<dyn ClientFactory>
    ))
}

/// Connect a manager and drive it to `Connected`.
pub async fn connected_manager(factory: &Arc<MockFactory>) -> Arc<SessionManager> {
    let session = manager_with(factory);
    session.connect().await.expect("handshake should start");
    factory.emit(SessionEvent::Ready).await;
    settle().await;
    assert_eq!(session.status().await.state, SessionState::Connected);
    session
}
