// Relay behaviour over a real WebSocket server: live delivery, echo,
// offline fallback to history, bad tokens and reconnects.

use std::time::Duration;

use dm_relay::relay::ServerFrame;

use test_utils::spawn_app;

const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_live_delivery_and_echo() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut alice_ws = app.connect_as(&alice).await;
    let mut bob_ws = app.connect_as(&bob).await;
    app.wait_for_connections(2).await;

    alice_ws.send_message(bob.id, "hi").await;

    let ServerFrame::Message { message: echoed } = alice_ws.expect_frame().await;
    let ServerFrame::Message { message: delivered } = bob_ws.expect_frame().await;

    assert_eq!(echoed, delivered);
    assert_eq!(delivered.sender_id, alice.id);
    assert_eq!(delivered.receiver_id, bob.id);
    assert_eq!(delivered.content, "hi");

    let history = app.history(&alice, bob.id).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], delivered.id);
    assert_eq!(history[0]["sender_id"], alice.id);
    assert_eq!(history[0]["receiver_id"], bob.id);
    assert_eq!(history[0]["content"], "hi");

    // Same conversation from the other side, and stable across fetches.
    assert_eq!(app.history(&bob, alice.id).await, history);
    assert_eq!(app.history(&alice, bob.id).await, history);
}

#[tokio::test]
async fn test_offline_receiver_reads_history() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut alice_ws = app.connect_as(&alice).await;
    app.wait_for_connections(1).await;

    alice_ws.send_message(bob.id, "see you later").await;
    let ServerFrame::Message { message } = alice_ws.expect_frame().await;

    let history = app.history(&bob, alice.id).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], message.id);
    assert_eq!(history[0]["content"], "see you later");
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut alice_ws = app.connect_as(&alice).await;
    let mut bob_ws = app.connect_as(&bob).await;
    app.wait_for_connections(2).await;

    for i in 0..10 {
        alice_ws.send_message(bob.id, &format!("message {}", i)).await;
    }

    let mut last_id = 0;
    for i in 0..10 {
        let ServerFrame::Message { message } = bob_ws.expect_frame().await;
        assert_eq!(message.content, format!("message {}", i));
        assert!(message.id > last_id);
        last_id = message.id;
    }
}

#[tokio::test]
async fn test_bad_token_closes_connection() {
    let app = spawn_app().await;

    let mut client = app.connect().await;
    client.auth("not-a-real-token").await;

    assert!(client.closed_within(Duration::from_secs(2)).await);
    assert_eq!(app.health().await.connections, 0);
}

#[tokio::test]
async fn test_frames_before_auth_are_ignored() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut client = app.connect().await;
    client.send_message(bob.id, "too early").await;
    client.send_json(serde_json::json!({ "type": "typing" })).await;
    assert!(client.next_frame(QUIET).await.is_none());

    client.auth(&alice.token).await;
    app.wait_for_connections(1).await;
    client.send_message(bob.id, "now it counts").await;

    let ServerFrame::Message { message } = client.expect_frame().await;
    assert_eq!(message.content, "now it counts");

    let history = app.history(&alice, bob.id).await;
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_invalid_sends_are_silently_dropped() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut alice_ws = app.connect_as(&alice).await;
    app.wait_for_connections(1).await;

    alice_ws.send_message(bob.id, "").await;
    alice_ws.send_message(9999, "nobody home").await;
    alice_ws
        .send_json(serde_json::json!({ "type": "message", "receiverId": bob.id }))
        .await;

    assert!(alice_ws.next_frame(QUIET).await.is_none());
    assert!(app.history(&alice, bob.id).await.is_empty());

    // The connection survives and keeps working.
    alice_ws.send_message(bob.id, "still here").await;
    let ServerFrame::Message { message } = alice_ws.expect_frame().await;
    assert_eq!(message.content, "still here");
}

#[tokio::test]
async fn test_disconnect_unregisters() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;

    let alice_ws = app.connect_as(&alice).await;
    app.wait_for_connections(1).await;

    alice_ws.close().await;
    app.wait_for_connections(0).await;
}

#[tokio::test]
async fn test_reconnect_supersedes_old_connection() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut bob_ws = app.connect_as(&bob).await;
    let old = app.connect_as(&alice).await;
    app.wait_for_connections(2).await;

    // The echo proves the new connection now holds alice's registration.
    let mut new = app.connect_as(&alice).await;
    new.send_message(bob.id, "back again").await;
    let ServerFrame::Message { message } = new.expect_frame().await;
    assert_eq!(message.content, "back again");
    bob_ws.expect_frame().await;

    // The old transport closing late must not evict the new one.
    old.close().await;
    tokio::time::sleep(QUIET).await;
    assert_eq!(app.health().await.connections, 2);

    bob_ws.send_message(alice.id, "welcome back").await;
    let ServerFrame::Message { message } = new.expect_frame().await;
    assert_eq!(message.content, "welcome back");
    assert_eq!(message.sender_id, bob.id);
}
