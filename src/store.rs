//! Document store: a small JSON-document layer over SQLite, standing in for
//! the hosted document database of the original deployment. Documents are
//! stored as serialized JSON bodies keyed by name; counters live in their
//! own table so increments stay atomic under concurrent clicks.

use chrono::Utc;
use serde_json::Value;

use crate::db::DbPool;
use crate::page::defaults::default_document;
use crate::page::model::PageDocument;

/// Key of the single page document. One document per deployment,
/// matching the original data layout.
pub const PAGE_DOC_KEY: &str = "main-bio";

type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Fetch a document body by key.
pub fn get_document(db: &DbPool, key: &str) -> Result<Option<Value>, StoreError> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    let body: Option<String> = conn
        .query_row("SELECT body FROM documents WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .ok();

    match body {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Write a document body. With `merge` set, the new body is recursively
/// merged into the stored one (object keys merge, everything else
/// overwrites) — the hosted-store merge semantics the editor relies on.
/// Without it, the body replaces the stored document wholesale.
pub fn set_document(db: &DbPool, key: &str, body: &Value, merge: bool) -> Result<(), StoreError> {
    let final_body = if merge {
        let mut base = get_document(db, key)?.unwrap_or(Value::Null);
        merge_value(&mut base, body);
        base
    } else {
        body.clone()
    };

    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (key, body, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        rusqlite::params![key, serde_json::to_string(&final_body)?, now],
    )?;
    Ok(())
}

/// Recursive JSON merge: objects merge key-by-key, any other value (and
/// any type mismatch) overwrites.
pub fn merge_value(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_val) in patch_map {
                merge_value(base_map.entry(key.clone()).or_insert(Value::Null), patch_val);
            }
        }
        (base_slot, patch_val) => *base_slot = patch_val.clone(),
    }
}

/// Atomically increment a named counter, creating it at zero first.
/// Returns the new value.
pub fn increment_counter(db: &DbPool, path: &str, by: i64) -> Result<i64, StoreError> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    conn.execute(
        "INSERT INTO counters (path, value) VALUES (?1, ?2)
         ON CONFLICT(path) DO UPDATE SET value = value + excluded.value",
        rusqlite::params![path, by],
    )?;
    let value = conn.query_row("SELECT value FROM counters WHERE path = ?1", [path], |row| {
        row.get(0)
    })?;
    Ok(value)
}

/// Read a single counter (0 when absent).
pub fn get_counter(db: &DbPool, path: &str) -> Result<i64, StoreError> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    let value = conn
        .query_row("SELECT value FROM counters WHERE path = ?1", [path], |row| {
            row.get(0)
        })
        .unwrap_or(0);
    Ok(value)
}

/// All counters under a path prefix, e.g. `clicks/` -> per-block counts.
pub fn counters_with_prefix(db: &DbPool, prefix: &str) -> Result<Vec<(String, i64)>, StoreError> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    let pattern = format!("{}%", prefix);
    let mut stmt = conn.prepare("SELECT path, value FROM counters WHERE path LIKE ?1")?;
    let rows = stmt
        .query_map([pattern], |row| Ok((row.get(0)?, row.get(1)?)))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

/// Load the page document, falling back to the built-in default when the
/// stored body is missing or unparseable — the public page never renders
/// blank (parse failures are logged, not surfaced).
pub fn load_page_document(db: &DbPool) -> PageDocument {
    match get_document(db, PAGE_DOC_KEY) {
        Ok(Some(body)) => match serde_json::from_value(body) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(error = %e, "Stored page document failed to parse, serving default");
                default_document()
            }
        },
        Ok(None) => default_document(),
        Err(e) => {
            tracing::error!(error = %e, "Page document fetch failed, serving default");
            default_document()
        }
    }
}

/// Persist a typed page document (wholesale replace).
pub fn save_page_document(db: &DbPool, doc: &PageDocument) -> Result<(), StoreError> {
    set_document(db, PAGE_DOC_KEY, &serde_json::to_value(doc)?, false)
}

/// First-boot seeding: write the default document if none exists yet.
pub fn ensure_page_document(db: &DbPool) -> Result<(), StoreError> {
    if get_document(db, PAGE_DOC_KEY)?.is_none() {
        tracing::info!("No page document found, seeding default");
        save_page_document(db, &default_document())?;
    }
    Ok(())
}
