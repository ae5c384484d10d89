use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws::broadcast::broadcast_to_all;
use crate::ws::protocol::ServerEvent;
use crate::ws::ConnectionSender;

/// Ping interval: server sends WebSocket ping every 30 seconds.
/// Prevents connection leaks from abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor-per-connection pattern for an authenticated live-preview socket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader task: drains client frames and answers pings
///
/// The mpsc channel allows any part of the system to push document updates
/// to this client by cloning the sender.
pub async fn run_connection(socket: WebSocket, state: AppState, admin_id: String) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    register_connection(&state, &admin_id, tx.clone());

    // Send the current document immediately so the preview starts in sync.
    {
        let db = state.db.clone();
        let document = tokio::task::spawn_blocking(move || crate::store::load_page_document(&db))
            .await
            .ok();
        if let Some(document) = document {
            let event = ServerEvent::DocumentUpdated { document };
            if let Ok(text) = serde_json::to_string(&event) {
                let _ = tx.send(Message::Text(text.into()));
            }
        }
    }

    tracing::info!(admin_id = %admin_id, "Live-preview actor started");

    // Spawn writer task: forwards mpsc messages to WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses
    let ping_handle = tokio::spawn(keepalive_loop(
        tx.clone(),
        pong_rx,
        PING_INTERVAL,
        PONG_TIMEOUT,
    ));

    // Reader loop: the preview channel is server-push only, so incoming
    // frames are keepalive traffic or noise.
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    tracing::debug!(
                        admin_id = %admin_id,
                        "Ignoring client text frame: {}",
                        text.chars().take(100).collect::<String>()
                    );
                }
                Message::Binary(_) => {
                    tracing::debug!(admin_id = %admin_id, "Ignoring client binary frame");
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(admin_id = %admin_id, reason = ?frame, "Client initiated close");
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(admin_id = %admin_id, error = %e, "WebSocket receive error");
                break;
            }
            None => {
                tracing::info!(admin_id = %admin_id, "WebSocket stream ended");
                break;
            }
        }
    }

    // Cleanup: abort writer and ping tasks
    writer_handle.abort();
    ping_handle.abort();

    unregister_connection(&state, &admin_id);

    tracing::info!(admin_id = %admin_id, "Live-preview actor stopped");
}

/// Push the current document to every connected preview after a mutation.
pub fn notify_document_updated(state: &AppState, document: crate::page::model::PageDocument) {
    broadcast_to_all(&state.connections, &ServerEvent::DocumentUpdated { document });
}

/// Keepalive: ping on every interval tick and require a pong within the
/// timeout. Pongs buffered since the last round are drained before each
/// ping so a stale (or unsolicited) pong cannot satisfy the current check.
async fn keepalive_loop(
    ping_tx: ConnectionSender,
    mut pong_rx: mpsc::UnboundedReceiver<()>,
    ping_interval: Duration,
    pong_timeout: Duration,
) {
    let mut ping_timer = interval(ping_interval);
    // Skip the first immediate tick
    ping_timer.tick().await;

    loop {
        ping_timer.tick().await;

        while pong_rx.try_recv().is_ok() {}

        if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
            // Writer task has died — connection is gone
            break;
        }

        match timeout(pong_timeout, pong_rx.recv()).await {
            Ok(Some(())) => {
                // Pong received, continue
            }
            _ => {
                tracing::warn!("Pong timeout, closing connection");
                let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                    code: 1001,
                    reason: "Pong timeout".into(),
                })));
                break;
            }
        }
    }
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}

/// Register a connection sender in the connection registry.
fn register_connection(state: &AppState, admin_id: &str, tx: ConnectionSender) {
    state
        .connections
        .entry(admin_id.to_string())
        .or_default()
        .push(tx);

    let conn_count = state.connections.get(admin_id).map(|v| v.len()).unwrap_or(0);
    tracing::debug!(admin_id = %admin_id, connections = conn_count, "Connection registered");
}

/// Remove closed connections from the registry for an admin.
/// After the reader loop exits, the tx sender is dropped, so any
/// corresponding receivers are closed. We remove senders that are closed.
fn unregister_connection(state: &AppState, admin_id: &str) {
    let mut remove_admin = false;

    if let Some(mut connections) = state.connections.get_mut(admin_id) {
        connections.retain(|sender| !sender.is_closed());
        if connections.is_empty() {
            remove_admin = true;
        }
    }

    if remove_admin {
        state.connections.remove(admin_id);
    }

    tracing::debug!(admin_id = %admin_id, "Connection unregistered");
}
