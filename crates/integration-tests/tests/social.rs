//! Chat, bingo and friends against a scripted backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use barbuddy_client::ClientError;
use barbuddy_client::remote::{Endpoint, Procedure, Table};
use barbuddy_client::testing::RecordingRemote;
use barbuddy_core::{TaskId, UserId, VenueId};
use barbuddy_integration_tests::{TestApp, at};
use serde_json::json;

#[tokio::test]
async fn test_chat_send_goes_through_sync_queue() {
    let remote = Arc::new(RecordingRemote::new());
    let app = TestApp::new(remote.clone(), at(2026, 10, 17, 22, 0));
    let chat = app.state.venue_chat();
    let venue = VenueId::new("1");

    assert!(matches!(
        chat.send_message(&venue, "hello"),
        Err(ClientError::NoActiveSession)
    ));

    let session = chat.create_or_get_session(&venue).await;
    let sent = chat.send_message(&venue, "  who's at the bar?  ").unwrap();
    assert_eq!(sent.content, "who's at the bar?");
    assert_eq!(sent.anonymous_name, session.anonymous_name);
    assert!(chat.send_message(&venue, &"x".repeat(201)).is_err());
    app.state.context().sync.drain().await;

    let sent_remote = remote.mutations_to(Endpoint::Procedure(Procedure::ChatSendMessage));
    assert_eq!(sent_remote.len(), 1);
    assert_eq!(sent_remote[0]["content"], "who's at the bar?");
    assert_eq!(
        remote
            .mutations_to(Endpoint::Procedure(Procedure::ChatCreateSession))
            .len(),
        1
    );
}

#[tokio::test]
async fn test_bingo_card_completion_is_reported() {
    let remote = Arc::new(RecordingRemote::new());
    let app = TestApp::new(remote.clone(), at(2026, 10, 17, 22, 0));
    app.state.profile().complete_onboarding("Alex", "Kim").unwrap();
    let bingo = app.state.bingo();
    for task in bingo.tasks() {
        assert!(bingo.complete_task(&task.id));
    }
    assert!(bingo.is_completed());
    assert!(!bingo.complete_task(&TaskId::new("dart-bird")));
    app.state.context().sync.drain().await;

    assert_eq!(
        remote
            .mutations_to(Endpoint::Procedure(Procedure::BingoCompleteTask))
            .len(),
        9
    );
    assert_eq!(
        remote
            .mutations_to(Endpoint::Procedure(Procedure::BingoCompleteBingo))
            .len(),
        1
    );
}

#[tokio::test]
async fn test_add_friend_by_handle() {
    let remote = Arc::new(RecordingRemote::new());
    remote.respond(
        Endpoint::Procedure(Procedure::UserSearchUser),
        json!({
            "userId": "#SamLee54321",
            "name": "Sam Lee",
            "nightsOut": 4,
            "barsHit": 9,
            "xp": 300
        }),
    );
    let app = TestApp::new(remote.clone(), at(2026, 10, 17, 22, 0));
    let profile = app.state.profile();
    profile.complete_onboarding("Alex", "Kim").unwrap();

    let friend = UserId::new("#SamLee54321");
    assert!(profile.add_friend(&friend).await);
    assert!(!profile.add_friend(&friend).await);
    let friends = profile.get().friends;
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].name, "Sam Lee");
    assert_eq!(friends[0].bars_hit, 9);

    assert!(profile.remove_friend(&friend));
    app.state.context().sync.drain().await;
    assert_eq!(
        remote
            .mutations_to(Endpoint::TableDelete(Table::Friends))
            .len(),
        1
    );
}
