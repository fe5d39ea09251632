//! Tests for roster archiving and the contact store.

use std::sync::Arc;

use async_trait::async_trait;

use pushkontak::bot::archiver::ContactArchiver;
use pushkontak::bot::directory::DirectoryService;
use pushkontak::bot::BotError;
use pushkontak::store::{
    ContactRecord, ContactStore, NullContactStore, SqliteContactStore, StoreError,
};

use crate::support::{connected_manager, group, MockClient, MockFactory};

const ROSTER: &[(&str, Option<&str>, Option<&str>)] = &[
    ("628111@c.us", Some("Alice"), None),
    ("628222@c.us", None, Some("Bee")),
    ("628333@c.us", None, None),
];

async fn archiver_with(store: Arc<dyn ContactStore>) -> ContactArchiver {
    let client = Arc::new(MockClient::new(vec![group("g1@g.us", "Team", ROSTER)]));
    let factory = MockFactory::new(client);
    let directory = Arc::new(DirectoryService::new(connected_manager(&factory).await));
    ContactArchiver::new(directory, store)
}

/// Store that always fails, standing in for an unreachable database.
struct BrokenStore;

#[async_trait]
impl ContactStore for BrokenStore {
    async fn insert_many(&self, _records: &[ContactRecord]) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

#[tokio::test]
async fn archive_snapshots_the_full_roster() {
    let archiver = archiver_with(Arc::new(NullContactStore)).await;

    let outcome = archiver.archive("g1@g.us").await.expect("archive");
    assert_eq!(outcome.saved, 3);
    assert_eq!(outcome.records.len(), 3);

    let numbers: Vec<&str> = outcome.records.iter().map(|r| r.number.as_str()).collect();
    assert_eq!(numbers, ["628111", "628222", "628333"]);
    let names: Vec<&str> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bee", "Unknown"]);
    assert!(outcome.records.iter().all(|r| r.group == "Team"));
}

#[tokio::test]
async fn archive_still_succeeds_when_store_is_down() {
    let archiver = archiver_with(Arc::new(BrokenStore)).await;

    // Silent persistence degradation: full batch reported despite zero
    // persisted rows.
    let outcome = archiver.archive("g1@g.us").await.expect("archive");
    assert_eq!(outcome.saved, 3);
    assert_eq!(outcome.records.len(), 3);
}

#[tokio::test]
async fn archive_requires_group_id() {
    let archiver = archiver_with(Arc::new(NullContactStore)).await;
    let err = archiver.archive("").await.expect_err("empty group id");
    assert!(matches!(err, BotError::InvalidArgument(_)));
}

#[tokio::test]
async fn archive_requires_connected_session() {
    let client = Arc::new(MockClient::new(vec![group("g1@g.us", "Team", ROSTER)]));
    let factory = MockFactory::new(client);
    let directory = Arc::new(DirectoryService::new(crate::support::manager_with(&factory)));
    let archiver = ContactArchiver::new(directory, Arc::new(NullContactStore));

    let err = archiver.archive("g1@g.us").await.expect_err("not connected");
    assert!(matches!(err, BotError::SessionNotReady));
}

#[tokio::test]
async fn sqlite_store_persists_the_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}/contacts.db", dir.path().display());
    let store = SqliteContactStore::connect(&url).await.expect("connect");

    let archiver = archiver_with(Arc::new(store)).await;
    let outcome = archiver.archive("g1@g.us").await.expect("archive");
    assert_eq!(outcome.saved, 3);

    // Re-open the database and count the persisted rows.
    let store = SqliteContactStore::connect(&url).await.expect("reconnect");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE group_name = 'Team'")
        .fetch_one(store.pool())
        .await
        .expect("count");
    assert_eq!(count, 3);
}
