use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt;
use crate::auth::setup;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub setup_token: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Salted SHA-256 of an admin password. Deliberately the same hashing stack
/// used for refresh tokens; the admin surface sits behind the setup token
/// and rate limiting, not behind a KDF.
fn hash_password(salt: &str, password: &str) -> String {
    jwt::hash_token(&format!("{}:{}", salt, password))
}

/// POST /api/auth/setup — Claim the first-boot setup token and create the
/// admin account. Rejected once an admin exists.
pub async fn setup_admin(
    State(state): State<AppState>,
    Json(req): Json<SetupRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Email and password are required".to_string(),
        ));
    }

    let db = state.db.clone();
    let token = req.setup_token.clone();
    let email = req.email.trim().to_lowercase();
    let password = req.password.clone();

    let admin_id = tokio::task::spawn_blocking(move || {
        let existing: i64 = {
            let conn = db
                .lock()
                .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "DB lock".to_string()))?;
            conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
                .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Count admins".to_string()))?
        };
        if existing > 0 {
            return Err((StatusCode::FORBIDDEN, "Setup already complete".to_string()));
        }

        let valid = setup::verify_setup_token(&db, &token)
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Verify token".to_string()))?;
        if !valid {
            return Err((StatusCode::FORBIDDEN, "Invalid setup token".to_string()));
        }

        let admin_id = Uuid::now_v7().to_string();
        let salt = hex::encode(rand::rng().random::<[u8; 16]>());
        let password_hash = hash_password(&salt, &password);
        let now = Utc::now().to_rfc3339();

        {
            let conn = db
                .lock()
                .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "DB lock".to_string()))?;
            conn.execute(
                "INSERT INTO admins (id, email, password_hash, password_salt, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![admin_id, email, password_hash, salt, now],
            )
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert admin: {}", e)))?;
        }

        setup::consume_setup_token(&db)
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Consume token".to_string()))?;

        Ok::<_, (StatusCode, String)>(admin_id)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    tracing::info!(admin_id = %admin_id, "Admin account created via setup token");
    issue_tokens(&state, &admin_id, &req.email.trim().to_lowercase()).await
}

/// POST /api/auth/login — Email/password login, rate limited.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    let db = state.db.clone();
    let email = req.email.trim().to_lowercase();
    let password = req.password.clone();
    let lookup_email = email.clone();

    let admin_id = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "DB lock".to_string()))?;

        let row: Result<(String, String, String), _> = conn.query_row(
            "SELECT id, password_hash, password_salt FROM admins WHERE email = ?1",
            [&lookup_email],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        );

        // Same error for unknown email and wrong password
        let (admin_id, stored_hash, salt) = row.map_err(|_| {
            (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
        })?;

        if hash_password(&salt, &password) != stored_hash {
            return Err((StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()));
        }

        Ok::<_, (StatusCode, String)>(admin_id)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    issue_tokens(&state, &admin_id, &email).await
}

/// POST /api/auth/refresh — Rotate a refresh token into a fresh token pair.
pub async fn refresh_tokens(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    let db = state.db.clone();
    let token = req.refresh_token.clone();

    let (admin_id, email) = tokio::task::spawn_blocking(move || {
        let admin_id = jwt::validate_and_consume_refresh_token(&db, &token)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired refresh token".to_string()))?;

        let conn = db
            .lock()
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "DB lock".to_string()))?;
        let email: String = conn
            .query_row("SELECT email FROM admins WHERE id = ?1", [&admin_id], |row| row.get(0))
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Unknown admin".to_string()))?;

        Ok::<_, (StatusCode, String)>((admin_id, email))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    issue_tokens(&state, &admin_id, &email).await
}

/// POST /api/auth/logout — Revoke a refresh token. Always succeeds.
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> StatusCode {
    let db = state.db.clone();
    let token = req.refresh_token.clone();

    let result = tokio::task::spawn_blocking(move || jwt::revoke_refresh_token(&db, &token)).await;
    if let Ok(Err(e)) = result {
        tracing::warn!(error = %e, "Refresh token revocation failed");
    }
    StatusCode::NO_CONTENT
}

/// Mint an access/refresh token pair and persist the refresh hash.
async fn issue_tokens(
    state: &AppState,
    admin_id: &str,
    email: &str,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    let access_token = jwt::issue_access_token(&state.jwt_secret, admin_id, email)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Issue token: {}", e)))?;

    let (refresh_token, refresh_hash) = jwt::issue_refresh_token();
    let db = state.db.clone();
    let aid = admin_id.to_string();
    tokio::task::spawn_blocking(move || jwt::store_refresh_token(&db, &aid, &refresh_hash))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Store token: {}", e)))?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
    }))
}
