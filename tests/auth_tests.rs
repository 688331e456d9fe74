use blog_portal::{
    AppConfig, AppState, MemoryRepository, SessionStore, create_router,
    models::AuthResponse,
};
use chrono::Duration;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Spawns the app with a configurable session lifetime, so expiry is
/// testable without waiting.
async fn spawn_app_with_ttl(session_ttl: Duration) -> String {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()),
        sessions: Arc::new(SessionStore::new(session_ttl)),
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn spawn_app() -> String {
    spawn_app_with_ttl(Duration::hours(1)).await
}

async fn register_and_login(client: &reqwest::Client, address: &str, username: &str) -> String {
    let response = client
        .post(format!("{address}/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{username}@x.com"),
            "password": "pw1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{address}/login"))
        .json(&serde_json::json!({ "username": username, "password": "pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let auth: AuthResponse = response.json().await.unwrap();
    auth.token
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // No Authorization header at all.
    let response = client.get(format!("{address}/me")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    // A token nobody ever issued.
    let response = client
        .get(format!("{address}/me"))
        .bearer_auth("deadbeef".repeat(8))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Wrong scheme.
    let response = client
        .get(format!("{address}/me"))
        .header("Authorization", "Basic dXNlcjpwdw==")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn register_login_me_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "alice").await;

    let response = client
        .get(format!("{address}/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    // The credential hash never crosses the wire.
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "alice").await;

    let response = client
        .post(format!("{address}/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // The token is dead from here on.
    let response = client
        .get(format!("{address}/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn expired_sessions_are_anonymous() {
    // Sessions are born expired in this app instance.
    let address = spawn_app_with_ttl(Duration::seconds(-1)).await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "alice").await;

    let response = client
        .get(format!("{address}/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn login_failures_share_one_response() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register_and_login(&client, &address, "alice").await;

    let wrong_password = client
        .post(format!("{address}/login"))
        .json(&serde_json::json!({ "username": "alice", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    let unknown_user = client
        .post(format!("{address}/login"))
        .json(&serde_json::json!({ "username": "mallory", "password": "pw1" }))
        .send()
        .await
        .unwrap();

    // Same status, same body: the response does not reveal which part of
    // the credentials was wrong.
    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_user.status(), 401);
    let body_a: serde_json::Value = wrong_password.json().await.unwrap();
    let body_b: serde_json::Value = unknown_user.json().await.unwrap();
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn sessions_do_not_leak_across_users() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let alice_token = register_and_login(&client, &address, "alice").await;
    let bob_token = register_and_login(&client, &address, "bob").await;

    let alice_me: serde_json::Value = client
        .get(format!("{address}/me"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let bob_me: serde_json::Value = client
        .get(format!("{address}/me"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(alice_me["username"], "alice");
    assert_eq!(bob_me["username"], "bob");
    assert_ne!(alice_me["id"], bob_me["id"]);
}
