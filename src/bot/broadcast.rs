//! Sequential broadcast to a group roster with randomized pacing.
//!
//! Sends are strictly sequential with a uniform 3–5 s jitter after each
//! success. Parallel dispatch would trip the platform's abuse detection;
//! the pacing here is a deliberate rate limit, not an implementation
//! shortcut. Per-participant failures are counted and logged but never
//! abort the run.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use super::directory::DirectoryService;
use super::session::SessionManager;
use super::BotError;

/// Jitter bounds between sends. The delay is drawn uniformly from
/// `[min_ms, max_ms)` after every successful send.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Inclusive lower jitter bound in milliseconds.
    pub min_ms: u64,
    /// Exclusive upper jitter bound in milliseconds.
    pub max_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_ms: 3000,
            max_ms: 5000,
        }
    }
}

/// Outcome of one broadcast run. Scoped to a single invocation; never
/// persisted. Re-running the same broadcast resends to everyone.
#[derive(Debug, Clone)]
pub struct BroadcastOutcome {
    /// Number of sends that succeeded.
    pub success_count: usize,
    /// Number of sends that failed.
    pub fail_count: usize,
    /// Human-readable completion summary.
    pub summary: String,
}

/// Executes send-to-all-participants jobs.
pub struct BroadcastJob {
    session: Arc<SessionManager>,
    directory: Arc<DirectoryService>,
    pacing: Pacing,
}

impl BroadcastJob {
    /// Create a broadcast job executor.
    pub fn new(
        session: Arc<SessionManager>,
        directory: Arc<DirectoryService>,
        pacing: Pacing,
    ) -> Self {
        Self {
            session,
            directory,
            pacing,
        }
    }

    /// Send `message` to every participant of `group_id`, sequentially.
    ///
    /// The full roster is always attempted once started; there is no
    /// cancellation and no whole-job timeout. Expect the call to run for
    /// minutes on large rosters given the per-send pacing.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::InvalidArgument`] when `group_id` or `message`
    /// is empty, and propagates roster-resolution errors
    /// ([`BotError::SessionNotReady`], [`BotError::GroupNotFound`]).
    /// Per-participant send failures are recorded in
    /// [`BroadcastOutcome::fail_count`] instead of failing the run.
    pub async fn run(&self, group_id: &str, message: &str) -> Result<BroadcastOutcome, BotError> {
        if group_id.is_empty() || message.is_empty() {
            return Err(BotError::InvalidArgument(
                "Group ID and message required".to_owned(),
            ));
        }

        let roster = self.directory.resolve_participants(group_id).await?;
        info!(group_id, participants = roster.len(), "broadcast started");

        let mut success_count: usize = 0;
        let mut fail_count: usize = 0;

        for participant in &roster {
            match self.session.send_message(&participant.id, message).await {
                Ok(()) => {
                    success_count = success_count.saturating_add(1);
                    tokio::time::sleep(self.jitter()).await;
                }
                Err(e) => {
                    warn!(participant = %participant.id, error = %e, "send failed");
                    fail_count = fail_count.saturating_add(1);
                }
            }
        }

        let summary =
            format!("Push kontak complete. Sent: {success_count}, failed: {fail_count}");
        info!(group_id, success_count, fail_count, "broadcast finished");
        Ok(BroadcastOutcome {
            success_count,
            fail_count,
            summary,
        })
    }

    fn jitter(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.pacing.min_ms..self.pacing.max_ms);
        Duration::from_millis(ms)
    }
}
