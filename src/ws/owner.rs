//! Handlers for operations that drive a game: phase and position control,
//! word list editing, kicking teams and revealing words.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

use super::handlers::{ack, respond};

fn state_changed(request_id: String, state: GameState) -> ServerMessage {
    ServerMessage::StateChanged { request_id, state }
}

pub async fn handle_start(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    team_ids: Vec<UserId>,
) -> ServerMessage {
    let result = state.start_game(actor, &game_id, &team_ids).await;
    respond(request_id, result, state_changed)
}

pub async fn handle_change_state(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    direction: Direction,
) -> ServerMessage {
    let result = state.change_state(actor, &game_id, direction).await;
    respond(request_id, result, state_changed)
}

pub async fn handle_change_position(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    direction: Direction,
) -> ServerMessage {
    let result = state.change_position(actor, &game_id, direction).await;
    respond(request_id, result, state_changed)
}

pub async fn handle_kick(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    team_id: UserId,
) -> ServerMessage {
    let result = state.kick_team(actor, &game_id, &team_id).await;
    respond(request_id, result, ack)
}

pub async fn handle_put_word(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
    term: String,
    definition: String,
) -> ServerMessage {
    let result = state.put_word(actor, &game_id, &term, &definition).await;
    respond(request_id, result, |request_id, word| {
        ServerMessage::WordCreated {
            request_id,
            word_id: word.id,
            position: word.position,
        }
    })
}

pub async fn handle_remove_word(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    word_id: WordId,
) -> ServerMessage {
    let result = state.remove_word(actor, &word_id).await;
    respond(request_id, result, ack)
}

pub async fn handle_change_term(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    word_id: WordId,
    term: String,
) -> ServerMessage {
    let result = state.change_term(actor, &word_id, &term).await;
    respond(request_id, result, ack)
}

pub async fn handle_change_definition(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    word_id: WordId,
    definition: String,
) -> ServerMessage {
    let result = state.change_definition(actor, &word_id, &definition).await;
    respond(request_id, result, ack)
}

pub async fn handle_reveal(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    word_id: WordId,
) -> ServerMessage {
    let result = state.reveal(actor, &word_id).await;
    respond(request_id, result, |request_id, mapping| {
        ServerMessage::Revealed {
            request_id,
            word_id,
            mapping,
        }
    })
}

pub async fn handle_admin_definitions(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
) -> ServerMessage {
    let result = state.admin_definitions(actor, &game_id).await;
    respond(request_id, result, |request_id, words| {
        ServerMessage::AdminDefinitions { request_id, words }
    })
}

pub async fn handle_admin_guessing(
    state: &Arc<AppState>,
    actor: &Actor,
    request_id: String,
    game_id: GameId,
) -> ServerMessage {
    let result = state.admin_guessing(actor, &game_id).await;
    respond(request_id, result, |request_id, words| {
        ServerMessage::AdminGuessing { request_id, words }
    })
}
