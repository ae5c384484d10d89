use axum::{middleware, Router};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::auth::login;
use crate::auth::middleware::JwtSecret;
use crate::editor;
use crate::site;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Inject the JWT secret into request extensions so the Claims extractor can find it.
async fn inject_jwt_secret(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(JwtSecret(state.jwt_secret.clone()));
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting: 5 requests per minute per IP on auth endpoints.
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12)
            .burst_size(5)
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    // Auth routes with rate limiting
    let auth_routes = Router::new()
        .route("/api/auth/setup", axum::routing::post(login::setup_admin))
        .route("/api/auth/login", axum::routing::post(login::login))
        .route("/api/auth/refresh", axum::routing::post(login::refresh_tokens))
        .route("/api/auth/logout", axum::routing::post(login::logout))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Public routes, no auth. The unlock gate is a casual deterrent, not an
    // auth surface, so it stays outside the rate limiter.
    let public_routes = Router::new()
        .route("/", axum::routing::get(site::bio_page))
        .route("/api/page", axum::routing::get(site::get_page))
        .route("/api/track/view", axum::routing::post(site::track_view))
        .route("/api/track/click/{block_id}", axum::routing::post(site::track_click))
        .route("/api/blocks/{id}/unlock", axum::routing::post(site::unlock_block));

    // Admin routes. The Claims extractor on each handler enforces the JWT.
    let admin_routes = Router::new()
        .route("/api/admin/page", axum::routing::get(editor::get_page))
        .route("/api/admin/page", axum::routing::put(editor::save_page))
        .route("/api/admin/blocks", axum::routing::post(editor::create_block))
        .route("/api/admin/blocks/reorder", axum::routing::put(editor::reorder_blocks))
        .route("/api/admin/blocks/{id}", axum::routing::put(editor::update_block))
        .route("/api/admin/blocks/{id}", axum::routing::delete(editor::delete_block))
        .route("/api/admin/analytics", axum::routing::get(editor::get_analytics));

    // Live-preview WebSocket endpoint (auth via query param, not JWT header)
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .merge(health)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_jwt_secret,
        ))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
