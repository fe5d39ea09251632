//! Orchestration core: session lifecycle, group directory, broadcast jobs,
//! and contact archiving.
//!
//! Everything here depends on the single process-wide [`session::SessionManager`];
//! the broadcast and archive operations additionally require the session to
//! be in the `Connected` state and fail fast otherwise.

pub mod archiver;
pub mod broadcast;
pub mod directory;
pub mod session;

use crate::whatsapp::WhatsAppError;

/// Errors from the orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The operation requires a connected WhatsApp session.
    #[error("WhatsApp not connected")]
    SessionNotReady,

    /// A required argument was missing or empty.
    #[error("{0}")]
    InvalidArgument(String),

    /// The requested group could not be resolved.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// The underlying bridge call failed.
    #[error(transparent)]
    Bridge(#[from] WhatsAppError),
}
