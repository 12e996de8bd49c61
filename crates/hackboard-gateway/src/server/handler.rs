//! WebSocket handler
//!
//! Upgrades connections and runs their socket loops. Registration happens
//! before any frame is processed; the cleanup path runs exactly once per
//! physical disconnect and announces the final room departure.

use crate::connection::Connection;
use crate::handlers::{FrameDispatcher, HandlerError};
use crate::protocol::{ClientFrame, FrameError, ServerFrame};
use crate::server::GatewayState;
use axum::{
    extract::{ws::Message, ConnectInfo, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use hackboard_core::ConnectionId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket, addr))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: axum::extract::ws::WebSocket, addr: SocketAddr) {
    let connection_id = ConnectionId::generate();

    // Channel feeding the outbound pump
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(state.config().gateway.message_buffer);

    let connection = Connection::new(connection_id.clone(), Some(addr.ip()), tx);
    state.registry().register(Arc::clone(&connection));

    tracing::info!(
        connection_id = %connection_id,
        remote_addr = %addr,
        "WebSocket connection established"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Send Welcome immediately, before any client frame is read.
    let welcome = ServerFrame::Welcome {
        connection_id: connection_id.clone(),
    };
    match welcome.to_json() {
        Ok(json) => {
            if ws_sink.send(Message::Text(json.into())).await.is_err() {
                tracing::warn!(connection_id = %connection_id, "Failed to send Welcome frame");
                cleanup_connection(&state, &connection_id).await;
                return;
            }
        }
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Failed to encode Welcome frame");
            cleanup_connection(&state, &connection_id).await;
            return;
        }
    }

    // Clone for the receive task
    let state_recv = state.clone();
    let connection_recv = Arc::clone(&connection);

    // Receive frames from the client
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if handle_text_frame(&state_recv, &connection_recv, &text)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %connection_recv.id(),
                        "Binary frames not supported, ignoring"
                    );
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Transport-level keepalive, handled by axum.
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(
                        connection_id = %connection_recv.id(),
                        "Client closed connection"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_recv.id(),
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    let connection_id_send = connection_id.clone();

    // Pump queued frames out to the socket
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame.to_json() {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(
                            connection_id = %connection_id_send,
                            "Failed to send frame to WebSocket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %connection_id_send,
                        error = %e,
                        "Failed to encode outbound frame"
                    );
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    tokio::select! {
        _ = recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
        }
        _ = send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
        }
    }

    cleanup_connection(&state, &connection_id).await;
}

/// Handle one text frame from the client
async fn handle_text_frame(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), HandlerError> {
    let frame = match ClientFrame::from_json(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.id(),
                error = %e,
                "Failed to parse frame"
            );
            // Malformed input is the client's problem, not a reason to drop
            // the connection.
            let error = ServerFrame::error(FrameError::new(
                "INVALID_PAYLOAD",
                "Could not parse frame",
            ));
            return connection
                .send(error)
                .await
                .map_err(|_| HandlerError::ConnectionClosed);
        }
    };

    match FrameDispatcher::dispatch(state, connection, frame).await {
        Ok(()) => Ok(()),
        Err(HandlerError::InvalidPayload(message)) => {
            let error = ServerFrame::error(FrameError::new("INVALID_PAYLOAD", message));
            connection
                .send(error)
                .await
                .map_err(|_| HandlerError::ConnectionClosed)
        }
        Err(e) => {
            tracing::warn!(
                connection_id = %connection.id(),
                error = %e,
                "Handler error, closing connection"
            );
            Err(e)
        }
    }
}

/// Clean up a connection on disconnect
async fn cleanup_connection(state: &GatewayState, connection_id: &ConnectionId) {
    tracing::info!(connection_id = %connection_id, "Cleaning up connection");

    // First unregister wins; a duplicate disconnect signal finds nothing.
    if let Some(transition) = state.registry().unregister(connection_id) {
        state.broadcaster().announce(&transition).await;
    }
}
