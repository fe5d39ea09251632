//! Roster snapshots persisted as saved contacts.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::directory::DirectoryService;
use super::BotError;
use crate::store::{ContactRecord, ContactStore};

/// Result of one archive call: the records built from the roster and how
/// many of them the call reports as saved.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    /// Number of records in the batch (the full roster size).
    pub saved: usize,
    /// The contact records, in roster order.
    pub records: Vec<ContactRecord>,
}

/// Snapshots a group roster into contact records and persists them.
pub struct ContactArchiver {
    directory: Arc<DirectoryService>,
    store: Arc<dyn ContactStore>,
}

impl ContactArchiver {
    /// Create an archiver writing through the given contact store.
    pub fn new(directory: Arc<DirectoryService>, store: Arc<dyn ContactStore>) -> Self {
        Self { directory, store }
    }

    /// Archive the roster of `group_id` as one bulk insert.
    ///
    /// Persistence failure degrades silently: the batch is dropped with a
    /// warning and the call still reports the full in-memory batch as
    /// saved. Stakeholders have flagged this policy for review; it is
    /// preserved as-is for now (see `DESIGN.md`).
    ///
    /// # Errors
    ///
    /// Returns [`BotError::InvalidArgument`] when `group_id` is empty, and
    /// propagates roster-resolution errors ([`BotError::SessionNotReady`],
    /// [`BotError::GroupNotFound`]).
    pub async fn archive(&self, group_id: &str) -> Result<ArchiveOutcome, BotError> {
        if group_id.is_empty() {
            return Err(BotError::InvalidArgument("Group ID required".to_owned()));
        }

        let roster = self.directory.resolve_participants(group_id).await?;
        let saved_at = Utc::now();
        let records: Vec<ContactRecord> = roster
            .iter()
            .map(|p| ContactRecord {
                number: p.number().to_owned(),
                name: p.display_name.clone(),
                group: p.group_name.clone(),
                saved_at,
            })
            .collect();

        if let Err(e) = self.store.insert_many(&records).await {
            warn!(error = %e, count = records.len(), "contact store unavailable, batch not persisted");
        }

        info!(group_id, count = records.len(), "roster archived");
        Ok(ArchiveOutcome {
            saved: records.len(),
            records,
        })
    }
}
