//! Integration tests for the live-preview WebSocket: auth close codes,
//! the initial document push, and broadcasts after editor mutations.

use futures_util::StreamExt;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Helper: start the server on a random port and return
/// (base_url, setup_token, addr, jwt_secret).
async fn start_test_server() -> (String, String, SocketAddr, Vec<u8>) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = biolink_server::db::init_db(&data_dir).expect("Failed to init DB");
    biolink_server::store::ensure_page_document(&db).expect("Failed to seed document");
    let jwt_secret = biolink_server::auth::jwt::load_or_generate_jwt_secret(&data_dir)
        .expect("Failed to generate JWT secret");
    let setup_token = biolink_server::auth::setup::maybe_generate_setup_token(&db)
        .expect("Failed to generate setup token")
        .expect("Expected setup token");

    let state = biolink_server::state::AppState {
        db,
        jwt_secret: jwt_secret.clone(),
        connections: biolink_server::ws::new_connection_registry(),
        data_dir: data_dir.clone(),
    };

    let app = biolink_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    (format!("http://{}", addr), setup_token, addr, jwt_secret)
}

/// Helper: complete first-boot setup and return an access token.
async fn register_admin(client: &reqwest::Client, base_url: &str, setup_token: &str) -> String {
    let resp = client
        .post(format!("{}/api/auth/setup", base_url))
        .json(&json!({
            "setup_token": setup_token,
            "email": "admin@example.com",
            "password": "pw"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

/// Read the next Text frame within a timeout and parse it as JSON.
async fn next_json_frame(
    read: &mut futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
            .await
            .expect("Expected a frame within timeout")
            .expect("Stream ended unexpectedly")
            .expect("WebSocket read error");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Frame is not valid JSON")
            }
            Message::Ping(_) => continue,
            other => panic!("Expected a text frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn connect_with_a_valid_token_pushes_the_current_document() {
    let (base_url, setup_token, addr, _secret) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = register_admin(&client, &base_url, &setup_token).await;

    let ws_url = format!("ws://{}/ws?token={}", addr, token);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut _write, mut read) = ws_stream.split();

    // The server pushes the current document immediately on connect.
    let event = next_json_frame(&mut read).await;
    assert_eq!(event["type"], "documentUpdated");
    assert_eq!(event["document"]["profile"]["name"], "Your Name");
    assert!(event["document"]["blocks"].is_array());
}

#[tokio::test]
async fn invalid_token_closes_with_4002() {
    let (_base_url, _setup_token, addr, _secret) = start_test_server().await;

    let ws_url = format!("ws://{}/ws?token=not-a-jwt", addr);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("WebSocket should upgrade even with a bad token");
    let (mut _write, mut read) = ws_stream.split();

    let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
        .await
        .expect("Expected close frame within timeout");
    match msg {
        Some(Ok(Message::Close(Some(frame)))) => {
            assert_eq!(
                frame.code,
                tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::from(4002),
            );
        }
        other => panic!("Expected close frame with code 4002, got {:?}", other),
    }
}

#[tokio::test]
async fn expired_token_closes_with_4001() {
    let (_base_url, _setup_token, addr, secret) = start_test_server().await;

    // Sign a token that expired well past the validation leeway.
    let now = chrono::Utc::now().timestamp();
    let claims = biolink_server::auth::middleware::Claims {
        sub: "admin".to_string(),
        email: "admin@example.com".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(&secret),
    )
    .unwrap();

    let ws_url = format!("ws://{}/ws?token={}", addr, expired);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("WebSocket should upgrade even with an expired token");
    let (mut _write, mut read) = ws_stream.split();

    let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
        .await
        .expect("Expected close frame within timeout");
    match msg {
        Some(Ok(Message::Close(Some(frame)))) => {
            assert_eq!(
                frame.code,
                tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::from(4001),
            );
        }
        other => panic!("Expected close frame with code 4001, got {:?}", other),
    }
}

#[tokio::test]
async fn editor_mutations_broadcast_document_updated() {
    let (base_url, setup_token, addr, _secret) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = register_admin(&client, &base_url, &setup_token).await;

    let ws_url = format!("ws://{}/ws?token={}", addr, token);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut _write, mut read) = ws_stream.split();

    // Drain the initial snapshot first.
    let initial = next_json_frame(&mut read).await;
    assert_eq!(initial["type"], "documentUpdated");

    // Mutate through the editor API while the preview is connected.
    let resp = client
        .post(format!("{}/api/admin/blocks", base_url))
        .bearer_auth(&token)
        .json(&json!({
            "type": "standard",
            "title": "Broadcast Me",
            "url": "https://example.com/new"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let event = next_json_frame(&mut read).await;
    assert_eq!(event["type"], "documentUpdated");
    let blocks = event["document"]["blocks"].as_array().unwrap();
    assert!(blocks.iter().any(|b| b["title"] == "Broadcast Me"));
}
