pub mod handlers;
mod owner;
mod team;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::protocol::{ClientRequest, EventEnvelope, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::Actor;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Caller identity; a fresh user is created when absent
    pub user: Option<String>,
    /// Connection id used to tag emitted events; generated when absent
    pub session: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(user = ?params.user, session = ?params.session, "WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let user_id = match params.user.filter(|u| !u.is_empty()) {
        Some(user_id) => {
            state.register_user(&user_id).await;
            user_id
        }
        None => state.create_user().await,
    };
    let session_id = params
        .session
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ulid::Ulid::new().to_string());
    let actor = Actor {
        user_id,
        session_id,
    };
    tracing::info!(user = %actor.user_id, session = %actor.session_id, "WebSocket connected");

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        user_id: actor.user_id.clone(),
        session_id: actor.session_id.clone(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    // Events of the game this socket subscribed to, if any
    let mut game_rx: Option<broadcast::Receiver<EventEnvelope>> = None;

    loop {
        tokio::select! {
            event = async {
                match &mut game_rx {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                match event {
                    Ok(envelope) => {
                        if !send_json(&mut sender, &ServerMessage::Event { envelope }).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, session = %actor.session_id, "Subscriber lagged behind");
                        let notice = ServerMessage::Error {
                            request_id: None,
                            code: "EVENTS_DROPPED".to_string(),
                            msg: format!("{skipped} events were dropped, refetch the game"),
                        };
                        if !send_json(&mut sender, &notice).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => game_rx = None,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<ClientRequest>(&text) {
                            Ok(request) => {
                                let response = handlers::handle_message(request, &actor, &state).await;
                                if let ServerMessage::Subscribed { game_id, .. } = &response {
                                    game_rx = Some(state.broadcaster.subscribe(game_id).await);
                                    tracing::debug!(game_id = %game_id, session = %actor.session_id, "Subscribed to game");
                                }
                                response
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                ServerMessage::Error {
                                    request_id: None,
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                }
                            }
                        };
                        if !send_json(&mut sender, &response).await {
                            tracing::error!("Failed to send response");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!(user = %actor.user_id, session = %actor.session_id, "WebSocket connection closed");
}
