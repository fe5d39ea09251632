//! Group directory: listing groups and resolving their rosters.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::session::SessionManager;
use super::BotError;
use crate::whatsapp::WhatsAppError;

/// Summary of a group chat, recomputed on every listing request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Stable group identifier.
    pub id: String,
    /// Group display name.
    pub name: String,
    /// Number of participants at listing time.
    pub participants_count: usize,
}

/// A group member, resolved at call time.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Full participant JID.
    pub id: String,
    /// Display name: contact name, else push name, else `"Unknown"`.
    pub display_name: String,
    /// Name of the group the roster was resolved from.
    pub group_name: String,
}

/// Lists groups and resolves rosters through the session manager.
pub struct DirectoryService {
    session: Arc<SessionManager>,
}

impl DirectoryService {
    /// Create a directory backed by the given session manager.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// List all group chats.
    ///
    /// Tolerant read: returns an empty list when the session is not
    /// connected or the chat list cannot be fetched, never an error. Order
    /// is whatever the bridge returns.
    pub async fn list_groups(&self) -> Vec<GroupSummary> {
        let chats = match self.session.get_chats().await {
            Ok(chats) => chats,
            Err(BotError::SessionNotReady) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "chat listing failed");
                return Vec::new();
            }
        };
        chats
            .into_iter()
            .filter(|chat| chat.is_group)
            .map(|chat| GroupSummary {
                id: chat.id,
                name: chat.name,
                participants_count: chat.participants.len(),
            })
            .collect()
    }

    /// Resolve the roster of the given group.
    ///
    /// Unlike [`list_groups`](Self::list_groups), this is a strict read.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::SessionNotReady`] when not connected,
    /// [`BotError::GroupNotFound`] if the bridge cannot resolve the id, and
    /// [`BotError::Bridge`] for other bridge failures.
    pub async fn resolve_participants(&self, group_id: &str) -> Result<Vec<Participant>, BotError> {
        let chat = self
            .session
            .get_chat_by_id(group_id)
            .await
            .map_err(|e| match e {
                BotError::Bridge(WhatsAppError::ChatNotFound(id)) => BotError::GroupNotFound(id),
                other => other,
            })?;
        Ok(chat
            .participants
            .iter()
            .map(|p| Participant {
                id: p.id.clone(),
                display_name: p
                    .name
                    .clone()
                    .or_else(|| p.push_name.clone())
                    .unwrap_or_else(|| "Unknown".to_owned()),
                group_name: chat.name.clone(),
            })
            .collect())
    }
}

impl Participant {
    /// Phone number derived from the JID (the part before `@`).
    pub fn number(&self) -> &str {
        self.id.split('@').next().unwrap_or(&self.id)
    }
}
