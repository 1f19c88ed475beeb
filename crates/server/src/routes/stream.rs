// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /tasks/:task_id/stream` — the Status Stream's websocket endpoint
//! (§4.8), grounded on the pack's `on_upgrade`/`handle_socket` split rather
//! than the teacher's own stack (it has no HTTP-serving code at all; its
//! `oj-adapters` uses `tokio-tungstenite` only as a client).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use behemoth_core::Clock;

use crate::app_state::AppState;

pub async fn task_stream<C: Clock + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<C>>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, task_id))
}

/// Replays history from the per-task log file, then forwards lines
/// appended afterward until the client disconnects (§4.8).
async fn handle_socket<C: Clock + 'static>(mut socket: WebSocket, state: AppState<C>, task_id: String) {
    for line in state.status.replay(&task_id) {
        if socket.send(Message::Text(line.into())).await.is_err() {
            return;
        }
    }

    let mut receiver = state.status.subscribe(&task_id);
    loop {
        tokio::select! {
            line = receiver.recv() => {
                match line {
                    Ok(line) => {
                        if socket.send(Message::Text(line.into())).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    }
}
