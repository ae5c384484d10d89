//! Integration tests for admin auth: setup-token bootstrap, login,
//! refresh token rotation, and route protection.

use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Helper: start the server on a random port and return (base_url, setup_token).
async fn start_test_server() -> (String, String) {
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
        jwt_secret,
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

    (format!("http://{}", addr), setup_token)
}

#[tokio::test]
async fn setup_requires_the_printed_token() {
    let (base_url, setup_token) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/auth/setup", base_url))
        .json(&json!({
            "setup_token": "definitely-wrong",
            "email": "admin@example.com",
            "password": "correct horse"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(format!("{}/api/auth/setup", base_url))
        .json(&json!({
            "setup_token": setup_token,
            "email": "admin@example.com",
            "password": "correct horse"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["access_token"].as_str().unwrap().len() > 20);
    assert!(body["refresh_token"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn login_checks_the_password_and_setup_is_single_use() {
    let (base_url, setup_token) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/auth/setup", base_url))
        .json(&json!({
            "setup_token": setup_token,
            "email": "admin@example.com",
            "password": "correct horse"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Second setup attempt is rejected even with the real token
    let resp = client
        .post(format!("{}/api/auth/setup", base_url))
        .json(&json!({
            "setup_token": setup_token,
            "email": "intruder@example.com",
            "password": "x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({"email": "admin@example.com", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({"email": "admin@example.com", "password": "correct horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn refresh_tokens_rotate_and_are_single_use() {
    let (base_url, setup_token) = start_test_server().await;
    let client = reqwest::Client::new();

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
    let body: serde_json::Value = resp.json().await.unwrap();
    let refresh = body["refresh_token"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/api/auth/refresh", base_url))
        .json(&json!({"refresh_token": refresh}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let rotated: serde_json::Value = resp.json().await.unwrap();
    assert_ne!(rotated["refresh_token"].as_str(), Some(refresh.as_str()));

    // The consumed token no longer works
    let resp = client
        .post(format!("{}/api/auth/refresh", base_url))
        .json(&json!({"refresh_token": refresh}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn admin_routes_reject_missing_and_garbage_tokens() {
    let (base_url, _setup_token) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/admin/page", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/api/admin/analytics", base_url))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
