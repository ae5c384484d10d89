use serde::Serialize;

use crate::page::model::PageDocument;

/// Server-to-client live preview events, sent as JSON text frames.
/// The document is JSON end to end, so no binary wire format is involved.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The page document changed (save or block mutation). Carries the full
    /// updated document so the preview can re-render without a refetch.
    DocumentUpdated { document: PageDocument },
}
