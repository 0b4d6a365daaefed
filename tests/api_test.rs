// HTTP surface around the relay: signup, login, user listing, history.

use reqwest::StatusCode;

use test_utils::{spawn_app, PASSWORD};

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let health = app.health().await;

    assert_eq!(health.status, "healthy");
    assert_eq!(health.connections, 0);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;

    let response = app.register("Alice").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");

    let response = app.login("alice", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| t.contains('.')));
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = spawn_app().await;

    assert_eq!(app.register("alice").await.status(), StatusCode::CREATED);
    assert_eq!(app.register("alice").await.status(), StatusCode::CONFLICT);
    assert_eq!(app.register("x").await.status(), StatusCode::BAD_REQUEST);

    let short_password = app
        .http
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({ "username": "bobby", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;
    app.register("alice").await;

    assert_eq!(
        app.login("alice", "definitely wrong").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("nobody", PASSWORD).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    let missing = app.http.get(app.url("/api/users")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let forged = app.get_authed("/api/users", "forged.token").await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_and_user_listing() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let carol = app.create_user("carol").await;

    let me: serde_json::Value = app.get_authed("/api/auth/me", &alice.token).await.json().await.unwrap();
    assert_eq!(me["id"], alice.id);
    assert_eq!(me["username"], alice.username);
    assert!(me.get("password_hash").is_none());

    let users: Vec<serde_json::Value> = app.get_authed("/api/users", &alice.token).await.json().await.unwrap();
    let ids: Vec<i64> = users.iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&bob.id));
    assert!(ids.contains(&carol.id));
}

#[tokio::test]
async fn test_history_for_unknown_user() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;

    let response = app.get_authed("/api/messages/9999", &alice.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
