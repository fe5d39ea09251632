//! Tests for group listing and roster resolution.

use std::sync::Arc;

use pushkontak::bot::directory::DirectoryService;
use pushkontak::bot::BotError;

use crate::support::{connected_manager, direct_chat, group, manager_with, MockClient, MockFactory};

#[tokio::test]
async fn list_groups_is_empty_when_not_connected() {
    let client = Arc::new(MockClient::new(vec![group("g1", "Team", &[])]));
    let factory = MockFactory::new(client);
    let directory = DirectoryService::new(manager_with(&factory));

    // Tolerant read: empty list, never an error.
    assert!(directory.list_groups().await.is_empty());
}

#[tokio::test]
async fn resolve_participants_fails_when_not_connected() {
    let client = Arc::new(MockClient::new(vec![group("g1", "Team", &[])]));
    let factory = MockFactory::new(client);
    let directory = DirectoryService::new(manager_with(&factory));

    let err = directory
        .resolve_participants("g1")
        .await
        .expect_err("strict read");
    assert!(matches!(err, BotError::SessionNotReady));
}

#[tokio::test]
async fn list_groups_filters_direct_chats() {
    let chats = vec![
        group(
            "g1@g.us",
            "Team",
            &[("a@c.us", Some("Alice"), None), ("b@c.us", None, None)],
        ),
        direct_chat("a@c.us", "Alice"),
    ];
    let client = Arc::new(MockClient::new(chats));
    let factory = MockFactory::new(client);
    let directory = DirectoryService::new(connected_manager(&factory).await);

    let groups = directory.list_groups().await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "g1@g.us");
    assert_eq!(groups[0].name, "Team");
    assert_eq!(groups[0].participants_count, 2);
}

#[tokio::test]
async fn display_name_falls_back_to_push_name_then_unknown() {
    let chats = vec![group(
        "g1@g.us",
        "Team",
        &[
            ("a@c.us", Some("Alice"), Some("push-a")),
            ("b@c.us", None, Some("Bee")),
            ("c@c.us", None, None),
        ],
    )];
    let client = Arc::new(MockClient::new(chats));
    let factory = MockFactory::new(client);
    let directory = DirectoryService::new(connected_manager(&factory).await);

    let roster = directory.resolve_participants("g1@g.us").await.expect("roster");
    let names: Vec<&str> = roster.iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bee", "Unknown"]);
    assert!(roster.iter().all(|p| p.group_name == "Team"));
}

#[tokio::test]
async fn unknown_group_is_group_not_found() {
    let client = Arc::new(MockClient::new(vec![group("g1@g.us", "Team", &[])]));
    let factory = MockFactory::new(client);
    let directory = DirectoryService::new(connected_manager(&factory).await);

    let err = directory
        .resolve_participants("nope@g.us")
        .await
        .expect_err("unknown id");
    assert!(matches!(err, BotError::GroupNotFound(id) if id == "nope@g.us"));
}
