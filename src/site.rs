//! Public surface: the rendered bio page, the sanitized JSON view used by
//! client-side renderers, best-effort view/click tracking, and the unlock
//! endpoint for password-gated blocks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::page::gate::{self, Unlock};
use crate::page::model::{Block, BlockKind, Media, Pixels, Profile, Styling, Theme};
use crate::page::render::render_page;
use crate::page::resolve::resolve;
use crate::state::AppState;
use crate::store;

/// A block as exposed publicly: no password field, ever. Gated blocks also
/// hide their URL (the activation target is only handed out by the gate)
/// and carry `locked` instead.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub order: i64,
    pub title: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styling: Option<Styling>,
}

impl PublicBlock {
    fn from_block(block: &Block) -> Self {
        let locked = block.is_locked();
        Self {
            id: block.id.clone(),
            kind: block.kind,
            order: block.order,
            title: block.title.clone(),
            locked,
            url: if locked { None } else { block.url.clone() },
            thumbnail: block.thumbnail.clone(),
            description: block.description.clone(),
            images: block.images.clone(),
            artist: block.artist.clone(),
            platform: block.platform.clone(),
            price: block.price,
            embed_code: block.embed_code.clone(),
            styling: block.styling.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPageResponse {
    pub profile: Profile,
    pub theme: Theme,
    pub media: Media,
    pub pixels: Pixels,
    pub blocks: Vec<PublicBlock>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnlockResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// GET / — The public bio page, server-rendered. Visibility is resolved
/// against the current instant on every request; a store failure falls back
/// to the built-in default document so the page is never blank.
pub async fn bio_page(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let db = state.db.clone();
    let doc = tokio::task::spawn_blocking(move || store::load_page_document(&db))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Html(render_page(&doc, Utc::now())))
}

/// GET /api/page — Public JSON view: visible blocks only, in display order,
/// passwords stripped.
pub async fn get_page(State(state): State<AppState>) -> Result<Json<PublicPageResponse>, StatusCode> {
    let db = state.db.clone();
    let doc = tokio::task::spawn_blocking(move || store::load_page_document(&db))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let blocks = resolve(&doc.blocks, Utc::now())
        .into_iter()
        .map(PublicBlock::from_block)
        .collect();

    Ok(Json(PublicPageResponse {
        profile: doc.profile,
        theme: doc.theme,
        media: doc.media,
        pixels: doc.pixels,
        blocks,
    }))
}

/// POST /api/track/view — Count a page view. Best-effort telemetry: failures
/// are logged and swallowed, the response is always 204.
pub async fn track_view(State(state): State<AppState>) -> StatusCode {
    let db = state.db.clone();
    let result = tokio::task::spawn_blocking(move || {
        store::increment_counter(&db, "views/page", 1)?;
        let today = Utc::now().format("%Y-%m-%d");
        store::increment_counter(&db, &format!("views/daily/{}", today), 1)?;
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
    })
    .await;

    if let Ok(Err(e)) = result {
        tracing::warn!(error = %e, "Page view tracking failed");
    }
    StatusCode::NO_CONTENT
}

/// POST /api/track/click/{block_id} — Count a block click. Best-effort,
/// same contract as view tracking.
pub async fn track_click(State(state): State<AppState>, Path(block_id): Path<String>) -> StatusCode {
    let db = state.db.clone();
    let result = tokio::task::spawn_blocking(move || {
        store::increment_counter(&db, "clicks/total", 1)?;
        store::increment_counter(&db, &format!("clicks/{}", block_id), 1)?;
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
    })
    .await;

    if let Ok(Err(e)) = result {
        tracing::warn!(error = %e, "Click tracking failed");
    }
    StatusCode::NO_CONTENT
}

/// POST /api/blocks/{id}/unlock — The interaction gate. Exact plaintext
/// match against the stored password; the stored value is never part of
/// any response. Only currently-visible blocks can be unlocked, so an
/// inactive or out-of-schedule block cannot be activated through the gate.
pub async fn unlock_block(
    State(state): State<AppState>,
    Path(block_id): Path<String>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, (StatusCode, Json<serde_json::Value>)> {
    let db = state.db.clone();
    let doc = tokio::task::spawn_blocking(move || store::load_page_document(&db))
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal error"})),
            )
        })?;

    let now = Utc::now();
    let visible = resolve(&doc.blocks, now);
    let block = visible.into_iter().find(|b| b.id == block_id).ok_or((
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Block not found"})),
    ))?;

    match gate::try_unlock(block, &req.password) {
        Unlock::Granted { url } => Ok(Json(UnlockResponse { url })),
        Unlock::Denied => Err((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Incorrect password"})),
        )),
    }
}
