use super::protocol::ServerEvent;
use super::ConnectionRegistry;

/// Broadcast a live-preview event to all connected clients as a JSON text frame.
pub fn broadcast_to_all(registry: &ConnectionRegistry, event: &ServerEvent) {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize live-preview event");
            return;
        }
    };
    let msg = axum::extract::ws::Message::Text(text.into());

    for entry in registry.iter() {
        for sender in entry.value().iter() {
            let _ = sender.send(msg.clone());
        }
    }
}
