use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

use super::handlers::{ack, respond};

pub async fn handle_join(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    nickname: String,
) -> ServerMessage {
    let result = state.join_team(actor, &game_id, &nickname).await.map(|_| ());
    respond(request_id, result, ack)
}

pub async fn handle_leave(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
) -> ServerMessage {
    let result = state.leave_team(actor, &game_id).await;
    respond(request_id, result, ack)
}

pub async fn handle_change_readiness(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    ready: bool,
) -> ServerMessage {
    let result = state.change_readiness(actor, &game_id, ready).await;
    respond(request_id, result, ack)
}

pub async fn handle_change_nickname(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    nickname: String,
) -> ServerMessage {
    let result = state.change_nickname(actor, &game_id, &nickname).await;
    respond(request_id, result, ack)
}

pub async fn handle_put_definition(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    word_id: WordId,
    definition: Option<String>,
) -> ServerMessage {
    let result = state
        .put_definition(actor, &word_id, definition.as_deref())
        .await;
    respond(request_id, result, ack)
}

pub async fn handle_vote(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    word_id: WordId,
    guess: MaskedId,
) -> ServerMessage {
    let result = state.vote(actor, &word_id, &guess).await;
    respond(request_id, result, ack)
}

pub async fn handle_player_definitions(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
) -> ServerMessage {
    let result = state.player_definitions(actor, &game_id).await;
    respond(request_id, result, |request_id, words| {
        ServerMessage::PlayerDefinitions { request_id, words }
    })
}

pub async fn handle_player_guessing(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
) -> ServerMessage {
    let result = state.player_guessing(actor, &game_id).await;
    respond(request_id, result, |request_id, words| {
        ServerMessage::PlayerGuessing { request_id, words }
    })
}
