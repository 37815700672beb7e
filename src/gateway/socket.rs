//! WebSocket admission and per-connection loop.

use axum::{
    body::Bytes,
    extract::{
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::gateway::protocol::{DisconnectReason, Event, MAINTENANCE_EVENT};
use crate::gateway::registry::{Outbound, SessionHandle};
use crate::gateway::Gateway;
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::realtime::{Handshake, Identity};

/// Upgrade handler for `/realtime`.
pub async fn realtime_upgrade(
    State(gateway): State<Arc<Gateway>>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
) -> Response {
    if gateway.lifecycle().in_maintenance() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Server is in maintenance").into_response();
    }
    if gateway.at_capacity() {
        tracing::warn!(
            online = gateway.online(),
            max = gateway.max_connections(),
            "Realtime session limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Server is too busy").into_response();
    }

    let handshake = Handshake::new(headers);

    if let Err(e) = gateway.origins().check(&handshake) {
        tracing::warn!(error = %e, "Realtime handshake refused");
        return (StatusCode::FORBIDDEN, e.to_string()).into_response();
    }
    if let Err(message) = gateway.realtime().secure(&handshake) {
        tracing::warn!(reason = %message, "Realtime handshake failed security check");
        return (StatusCode::FORBIDDEN, message).into_response();
    }

    let identity = match gateway.authenticator().authorize(&handshake).await {
        Ok(identity) => identity,
        Err(e) => return (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
    };

    ws.on_upgrade(move |socket| serve_session(gateway, socket, identity))
}

/// Drive one connection until it closes.
async fn serve_session(gateway: Arc<Gateway>, socket: WebSocket, identity: Identity) {
    let id = ConnectionId::new();
    let (handle, outbound) = SessionHandle::new(id, identity);
    let registration = gateway.registry().register(handle.clone());
    metrics::record_connection();
    tracing::info!(connection_id = %id, online = gateway.online(), "Realtime session connected");

    gateway.realtime().on_connection(&handle);

    // A drain may have taken its snapshot between admission and registration.
    if gateway.lifecycle().in_maintenance() {
        handle.emit(MAINTENANCE_EVENT, Value::Null);
        gateway.disconnect(id, DisconnectReason::Maintenance);
    }

    let reason = pump(&gateway, id, socket, outbound).await;

    drop(registration);
    gateway.realtime().on_disconnect(id, reason);
    tracing::info!(
        connection_id = %id,
        reason = reason.as_str(),
        online = gateway.online(),
        "Realtime session disconnected"
    );
}

async fn pump(
    gateway: &Gateway,
    id: ConnectionId,
    socket: WebSocket,
    mut outbound: tokio::sync::mpsc::UnboundedReceiver<Outbound>,
) -> DisconnectReason {
    let (mut sink, mut stream) = socket.split();

    let interval = gateway.heartbeat().interval();
    let timeout = gateway.heartbeat().timeout();
    let mut heartbeat = time::interval_at(Instant::now() + interval, interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > timeout {
                    tracing::warn!(connection_id = %id, "Heartbeat timeout, disconnecting");
                    let _ = sink.send(close_message(DisconnectReason::HeartbeatTimeout)).await;
                    return DisconnectReason::HeartbeatTimeout;
                }
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    return DisconnectReason::TransportError;
                }
            }
            queued = outbound.recv() => match queued {
                Some(Outbound::Event(event)) => {
                    let text = match event.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(connection_id = %id, error = %e, "Failed to encode event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        return DisconnectReason::TransportError;
                    }
                }
                Some(Outbound::Close(reason)) => {
                    let _ = sink.send(close_message(reason)).await;
                    let _ = sink.close().await;
                    return reason;
                }
                None => return DisconnectReason::Requested,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(message)) => {
                    last_seen = Instant::now();
                    match message {
                        Message::Text(text) => match Event::decode(text.as_str()) {
                            Ok(event) => gateway.realtime().on_event(id, event),
                            Err(e) => {
                                tracing::debug!(connection_id = %id, error = %e, "Ignoring malformed frame");
                            }
                        },
                        Message::Close(_) => return DisconnectReason::ClientClosed,
                        _ => {}
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %id, error = %e, "Socket read failed");
                    return DisconnectReason::TransportError;
                }
                None => return DisconnectReason::ClientClosed,
            },
        }
    }
}

fn close_message(reason: DisconnectReason) -> Message {
    Message::Close(Some(CloseFrame {
        code: reason.close_code(),
        reason: Utf8Bytes::from_static(reason.as_str()),
    }))
}
