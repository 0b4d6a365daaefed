use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;

use crate::api::state::AppState;
use crate::relay::{FrameOutcome, Relay};

/// How long the writer gets to flush and send a close frame after the session ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// GET /ws
pub async fn relay_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| run_session(socket, relay))
}

/// Drive one relay session over a WebSocket until either side closes.
pub async fn run_session(socket: WebSocket, relay: Relay) {
    let (mut sink, mut stream) = socket.split();
    let (mut session, mut outbound) = relay.open_session();
    let connection_id = session.connection().id();
    tracing::debug!(%connection_id, "relay socket opened");

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%connection_id, error = %e, "failed to encode frame");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });
    let mut writer_done = false;

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    if let FrameOutcome::Rejected = session.handle_text(text.as_str()).await {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(%connection_id, error = %e, "relay socket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            _ = &mut writer => {
                writer_done = true;
                break;
            }
        }
    }

    session.close().await;
    // Dropping the session releases its handle; once the registry and any
    // in-flight dispatch let go too, the writer sees the queue end.
    drop(session);

    if !writer_done && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
    tracing::debug!(%connection_id, "relay socket closed");
}
