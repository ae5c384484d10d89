//! Admin editor API: the page document's commit boundary. The editor keeps
//! its own in-memory draft client-side; these handlers persist drafts and
//! individual block mutations, then push the updated document to any
//! connected live previews. Last writer wins — concurrent editors are an
//! accepted non-goal.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::page::model::{Block, BlockKind, PageDocument, Schedule, Styling};
use crate::page::reorder::move_block;
use crate::state::AppState;
use crate::store;
use crate::ws::actor::notify_document_updated;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct SaveQuery {
    #[serde(default)]
    pub merge: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<BlockKind>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub embed_code: Option<String>,
    #[serde(default)]
    pub styling: Option<Styling>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub page_views: i64,
    pub total_clicks: i64,
    pub block_clicks: BTreeMap<String, i64>,
    pub daily_views: BTreeMap<String, i64>,
}

// --- Handlers ---

/// GET /api/admin/page — Full document for the editor, passwords included
/// (the editor must round-trip them).
pub async fn get_page(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<Json<PageDocument>, StatusCode> {
    let db = state.db.clone();
    let doc = tokio::task::spawn_blocking(move || store::load_page_document(&db))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(doc))
}

/// PUT /api/admin/page?merge=bool — Save the editor's draft. With merge set,
/// the body is merged into the stored document (hosted-store semantics);
/// otherwise it replaces it. The save is validated before anything is
/// written, so a rejected draft leaves the stored document untouched and
/// the editor keeps its draft.
pub async fn save_page(
    State(state): State<AppState>,
    _claims: Claims,
    Query(query): Query<SaveQuery>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<PageDocument>, (StatusCode, String)> {
    let db = state.db.clone();
    let merge = query.merge;

    let doc = tokio::task::spawn_blocking(move || {
        let final_body = if merge {
            let mut base = store::get_document(&db, store::PAGE_DOC_KEY)
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Load failed: {}", e)))?
                .unwrap_or(serde_json::Value::Null);
            store::merge_value(&mut base, &body);
            base
        } else {
            body
        };

        // Validate first: a bad draft must not reach the store.
        let doc: PageDocument = serde_json::from_value(final_body)
            .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid document: {}", e)))?;

        store::save_page_document(&db, &doc)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save failed: {}", e)))?;

        Ok::<_, (StatusCode, String)>(doc)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    notify_document_updated(&state, doc.clone());
    Ok(Json(doc))
}

/// POST /api/admin/blocks — Append a new block with a fresh id and
/// order = current list length.
pub async fn create_block(
    State(state): State<AppState>,
    _claims: Claims,
    Json(req): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<Block>), (StatusCode, String)> {
    let db = state.db.clone();

    let (doc, block) = tokio::task::spawn_blocking(move || {
        let mut doc = store::load_page_document(&db);

        let mut block = Block::new(
            Uuid::now_v7().to_string(),
            req.kind.unwrap_or(BlockKind::Standard),
            doc.blocks.len() as i64,
        );
        block.title = req.title.unwrap_or_else(|| "New Link".to_string());
        block.url = req.url;
        block.thumbnail = req.thumbnail;
        block.description = req.description;
        block.password = req.password.filter(|p| !p.is_empty());
        block.schedule = req.schedule;
        block.images = req.images;
        block.artist = req.artist;
        block.platform = req.platform;
        block.price = req.price;
        block.embed_code = req.embed_code;
        block.styling = req.styling;

        doc.blocks.push(block.clone());
        store::save_page_document(&db, &doc)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save failed: {}", e)))?;

        Ok::<_, (StatusCode, String)>((doc, block))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    notify_document_updated(&state, doc);
    Ok((StatusCode::CREATED, Json(block)))
}

/// PUT /api/admin/blocks/{id} — Replace a block's fields in place.
/// The path id is authoritative; a body id is optional and overwritten.
pub async fn update_block(
    State(state): State<AppState>,
    _claims: Claims,
    Path(block_id): Path<String>,
    Json(mut body): Json<serde_json::Value>,
) -> Result<Json<Block>, (StatusCode, String)> {
    let db = state.db.clone();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), serde_json::Value::String(block_id));
    }
    let mut updated: Block = serde_json::from_value(body)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid block: {}", e)))?;
    updated.password = updated.password.filter(|p| !p.is_empty());

    let (doc, block) = tokio::task::spawn_blocking(move || {
        let mut doc = store::load_page_document(&db);

        let slot = doc
            .blocks
            .iter_mut()
            .find(|b| b.id == updated.id)
            .ok_or((StatusCode::NOT_FOUND, "Block not found".to_string()))?;
        *slot = updated.clone();

        store::save_page_document(&db, &doc)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save failed: {}", e)))?;

        Ok::<_, (StatusCode, String)>((doc, updated))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    notify_document_updated(&state, doc);
    Ok(Json(block))
}

/// DELETE /api/admin/blocks/{id} — Remove a block from the document.
/// Remaining order values may stay sparse; only relative order matters.
pub async fn delete_block(
    State(state): State<AppState>,
    _claims: Claims,
    Path(block_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let db = state.db.clone();

    let doc = tokio::task::spawn_blocking(move || {
        let mut doc = store::load_page_document(&db);

        let before = doc.blocks.len();
        doc.blocks.retain(|b| b.id != block_id);
        if doc.blocks.len() == before {
            return Err((StatusCode::NOT_FOUND, "Block not found".to_string()));
        }

        store::save_page_document(&db, &doc)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save failed: {}", e)))?;

        Ok::<_, (StatusCode, String)>(doc)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    notify_document_updated(&state, doc);
    Ok(StatusCode::OK)
}

/// PUT /api/admin/blocks/reorder — Apply a drag-and-drop outcome: move the
/// block at display position `from` to `to` and renumber orders densely.
pub async fn reorder_blocks(
    State(state): State<AppState>,
    _claims: Claims,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<PageDocument>, (StatusCode, String)> {
    let db = state.db.clone();

    let doc = tokio::task::spawn_blocking(move || {
        let mut doc = store::load_page_document(&db);

        if !move_block(&mut doc.blocks, req.from, req.to) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Positions out of range: {} -> {}", req.from, req.to),
            ));
        }

        store::save_page_document(&db, &doc)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save failed: {}", e)))?;

        Ok::<_, (StatusCode, String)>(doc)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    notify_document_updated(&state, doc.clone());
    Ok(Json(doc))
}

/// GET /api/admin/analytics — Aggregate the click/view counters.
pub async fn get_analytics(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<Json<AnalyticsResponse>, StatusCode> {
    let db = state.db.clone();

    let response = tokio::task::spawn_blocking(move || {
        let page_views = store::get_counter(&db, "views/page")
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let total_clicks = store::get_counter(&db, "clicks/total")
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let mut block_clicks = BTreeMap::new();
        for (path, value) in store::counters_with_prefix(&db, "clicks/")
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        {
            if let Some(block_id) = path.strip_prefix("clicks/") {
                if block_id != "total" {
                    block_clicks.insert(block_id.to_string(), value);
                }
            }
        }

        let mut daily_views = BTreeMap::new();
        for (path, value) in store::counters_with_prefix(&db, "views/daily/")
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        {
            if let Some(date) = path.strip_prefix("views/daily/") {
                daily_views.insert(date.to_string(), value);
            }
        }

        Ok::<_, StatusCode>(AnalyticsResponse {
            page_views,
            total_clicks,
            block_clicks,
            daily_views,
        })
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(response))
}
