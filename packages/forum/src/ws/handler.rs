//! WebSocket Handler
//!
//! Per-connection lifecycle: register, announce, then read frames one at a
//! time while a single writer task drains the connection's send queue.

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::repository::SessionStatus;

use super::connection::{ConnectionHandle, LifecyclePhase};
use super::dispatch::{ConnectionContext, dispatch_frame};
use super::hub::Hub;
use super::protocol::PresenceStatus;

/// Run an upgraded, already-authenticated socket until it closes.
pub async fn handle_socket(
    socket: WebSocket,
    hub: Arc<Hub>,
    user_id: String,
    session_token: String,
    queue_capacity: usize,
) {
    let (ws_sender, ws_receiver) = socket.split();
    run_connection(
        ws_sender,
        ws_receiver,
        hub,
        user_id,
        session_token,
        queue_capacity,
    )
    .await;
}

fn advance(phase: &mut LifecyclePhase, next: LifecyclePhase, conn_id: Uuid) {
    if let Err(e) = phase.transition(next) {
        error!(conn_id = %conn_id, "{}", e);
    }
}

pub(crate) async fn run_connection<W, R>(
    mut ws_sender: W,
    mut ws_receiver: R,
    hub: Arc<Hub>,
    user_id: String,
    session_token: String,
    queue_capacity: usize,
) where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut phase = LifecyclePhase::Authenticated;
    let (handle, mut rx) = ConnectionHandle::new(&user_id, &session_token, queue_capacity);
    let conn_id = handle.id();
    hub.metrics().connection_opened();

    let username = hub.display_name_or_id(&user_id).await;

    let gate = hub.presence_gate(&user_id).await;
    if let Some(previous) = hub.registry().register(handle.clone()).await {
        hub.metrics().connection_superseded();
        info!(user_id = %user_id, old_conn = %previous.id(), conn_id = %conn_id, "Connection superseded by reconnect");
    }
    advance(&mut phase, LifecyclePhase::Active, conn_id);
    info!(user_id = %user_id, conn_id = %conn_id, "WebSocket connection active");

    if let Err(e) = hub
        .store()
        .set_session_status(&session_token, SessionStatus::Online)
        .await
    {
        warn!(user_id = %user_id, "Failed to mark session online: {:#}", e);
    }
    hub.broadcast_status(&user_id, &username, PresenceStatus::Online)
        .await;
    drop(gate);
    hub.send_online_snapshot(&handle).await;

    let ctx = ConnectionContext {
        conn: handle.clone(),
        username,
    };

    // Single writer: everything bound for this socket goes through `rx`
    let sender_task = async {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    };

    let input_task = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    hub.metrics().frame_received();
                    dispatch_frame(&hub, &ctx, text.as_str()).await;
                }
                Ok(Message::Binary(_)) => {
                    hub.metrics().frame_received();
                    hub.metrics().frame_dropped();
                    debug!(user_id = %user_id, "Ignoring binary frame");
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(user_id = %user_id, "WebSocket read error: {}", e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = sender_task => debug!(conn_id = %conn_id, "Writer stopped"),
        _ = input_task => debug!(conn_id = %conn_id, "Reader stopped"),
        _ = handle.closed() => debug!(conn_id = %conn_id, "Connection closed by hub"),
    }

    advance(&mut phase, LifecyclePhase::Closing, conn_id);
    handle.close();
    let _ = ws_sender.close().await;

    // A reconnect cannot register until this cleanup is done
    let gate = hub.presence_gate(&user_id).await;
    let removed = hub.registry().remove_if_current(&user_id, conn_id).await;
    let successor = if removed {
        None
    } else {
        hub.registry().lookup(&user_id).await
    };

    match successor {
        Some(next) => {
            // The user is still online through the newer connection
            if next.session_token() != session_token {
                mark_offline(&hub, &user_id, &session_token).await;
            }
            info!(user_id = %user_id, conn_id = %conn_id, "Superseded connection closed");
        }
        None => {
            mark_offline(&hub, &user_id, &session_token).await;
            hub.broadcast_status(&user_id, &ctx.username, PresenceStatus::Offline)
                .await;
            info!(user_id = %user_id, conn_id = %conn_id, "WebSocket connection closed");
        }
    }
    drop(gate);

    advance(&mut phase, LifecyclePhase::Closed, conn_id);
    hub.metrics().connection_closed();
}

async fn mark_offline(hub: &Hub, user_id: &str, session_token: &str) {
    if let Err(e) = hub
        .store()
        .set_session_status(session_token, SessionStatus::Offline)
        .await
    {
        warn!(user_id = %user_id, "Failed to mark session offline: {:#}", e);
    }
}
