//! WebSocket connection lifecycle management.
//!
//! The stream is push-only: `connected`, then a full snapshot, then every
//! broadcast. Commands travel over HTTP, so inbound text is ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};

use crate::error::{RoomError, RoomResult};
use crate::http::AppState;
use crate::room::actor::{RoomHandle, Subscription};
use crate::util::id;

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ws: WebSocketUpgrade,
) -> RoomResult<Response> {
    let code =
        id::normalize_room_code(&code).ok_or_else(|| RoomError::bad_request("invalid room code"))?;
    let handle = state
        .rooms
        .get(&code)
        .ok_or_else(|| RoomError::not_found("room not found"))?;
    let subscription = handle.subscribe().await?;
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, handle, subscription))
        .into_response())
}

async fn handle_socket(socket: WebSocket, handle: RoomHandle, subscription: Subscription) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let Subscription {
        subscriber_id,
        mut events,
    } = subscription;

    // Forward hub events until the room drops us or the socket dies.
    let forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(%error, "event serialization failed");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Close(_) => break,
            // State only moves through the HTTP control surface.
            _ => {}
        }
    }

    handle.unsubscribe(subscriber_id).await;
    forward.abort();
}
