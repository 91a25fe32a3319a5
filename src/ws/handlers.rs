//! WebSocket message dispatch
//!
//! Every request gets exactly one reply carrying its `request_id`: a result,
//! an `ack`, or an `error`. Permission checks live in the state operations,
//! so the dispatch here only routes to the owner or team handler modules.

use crate::error::{GameError, GameResult};
use crate::protocol::{ClientMessage, ClientRequest, ServerMessage};
use crate::state::AppState;
use crate::types::Actor;
use std::sync::Arc;

use super::{owner, team};

/// Build the reply for a finished operation
pub(crate) fn respond<T>(
    request_id: String,
    result: GameResult<T>,
    ok: impl FnOnce(String, T) -> ServerMessage,
) -> ServerMessage {
    match result {
        Ok(value) => ok(request_id, value),
        Err(err) => error_reply(Some(request_id), &err),
    }
}

pub(crate) fn ack(request_id: String, _: ()) -> ServerMessage {
    ServerMessage::Ack { request_id }
}

pub(crate) fn error_reply(request_id: Option<String>, err: &GameError) -> ServerMessage {
    if err.is_defect() {
        tracing::error!(code = err.code(), error = %err, "Operation hit a data defect");
    } else {
        tracing::warn!(code = err.code(), error = %err, "Operation rejected");
    }
    ServerMessage::Error {
        request_id,
        code: err.code().to_string(),
        msg: err.to_string(),
    }
}

/// Handle a client request and return the reply
pub async fn handle_message(
    req: ClientRequest,
    actor: &Actor,
    state: &Arc<AppState>,
) -> ServerMessage {
    let ClientRequest {
        request_id,
        message,
    } = req;
    tracing::debug!(user = %actor.user_id, request_id = %request_id, "Handling {:?}", message);

    match message {
        // Shared
        ClientMessage::Subscribe { game_id } => {
            let result = state.get_game(actor, &game_id).await.map(|_| game_id);
            respond(request_id, result, |request_id, game_id| {
                ServerMessage::Subscribed {
                    request_id,
                    game_id,
                }
            })
        }

        ClientMessage::CreateGame => {
            let game = state.create_game(actor).await;
            ServerMessage::GameCreated {
                request_id,
                game: (&game).into(),
            }
        }

        ClientMessage::ListGames => ServerMessage::Games {
            request_id,
            games: state.list_games(actor).await,
        },

        ClientMessage::GetGame { game_id } => {
            let result = state.get_game(actor, &game_id).await;
            respond(request_id, result, |request_id, snapshot| {
                ServerMessage::Snapshot {
                    request_id,
                    snapshot,
                }
            })
        }

        // Owner
        ClientMessage::StartGame { game_id, team_ids } => {
            owner::handle_start(state, actor, request_id, game_id, team_ids).await
        }
        ClientMessage::ChangeState { game_id, direction } => {
            owner::handle_change_state(state, actor, request_id, game_id, direction).await
        }
        ClientMessage::ChangePosition { game_id, direction } => {
            owner::handle_change_position(state, actor, request_id, game_id, direction).await
        }
        ClientMessage::KickTeam { game_id, team_id } => {
            owner::handle_kick(state, actor, request_id, game_id, team_id).await
        }
        ClientMessage::PutWord {
            game_id,
            term,
            definition,
        } => owner::handle_put_word(state, actor, request_id, game_id, term, definition).await,
        ClientMessage::RemoveWord { word_id } => {
            owner::handle_remove_word(state, actor, request_id, word_id).await
        }
        ClientMessage::ChangeTerm { word_id, term } => {
            owner::handle_change_term(state, actor, request_id, word_id, term).await
        }
        ClientMessage::ChangeDefinition {
            word_id,
            definition,
        } => owner::handle_change_definition(state, actor, request_id, word_id, definition).await,
        ClientMessage::Reveal { word_id } => {
            owner::handle_reveal(state, actor, request_id, word_id).await
        }
        ClientMessage::GetAdminDefinitions { game_id } => {
            owner::handle_admin_definitions(state, actor, request_id, game_id).await
        }
        ClientMessage::GetAdminGuessing { game_id } => {
            owner::handle_admin_guessing(state, actor, request_id, game_id).await
        }

        // Team
        ClientMessage::JoinTeam { game_id, nickname } => {
            team::handle_join(state, actor, request_id, game_id, nickname).await
        }
        ClientMessage::LeaveTeam { game_id } => {
            team::handle_leave(state, actor, request_id, game_id).await
        }
        ClientMessage::ChangeReadiness { game_id, ready } => {
            team::handle_change_readiness(state, actor, request_id, game_id, ready).await
        }
        ClientMessage::ChangeNickname { game_id, nickname } => {
            team::handle_change_nickname(state, actor, request_id, game_id, nickname).await
        }
        ClientMessage::PutDefinition {
            word_id,
            definition,
        } => team::handle_put_definition(state, actor, request_id, word_id, definition).await,
        ClientMessage::Vote { word_id, guess } => {
            team::handle_vote(state, actor, request_id, word_id, guess).await
        }
        ClientMessage::GetPlayerDefinitions { game_id } => {
            team::handle_player_definitions(state, actor, request_id, game_id).await
        }
        ClientMessage::GetPlayerGuessing { game_id } => {
            team::handle_player_guessing(state, actor, request_id, game_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameState;

    fn request(id: &str, message: ClientMessage) -> ClientRequest {
        ClientRequest {
            request_id: id.to_string(),
            message,
        }
    }

    #[tokio::test]
    async fn test_errors_echo_request_id() {
        let state = Arc::new(AppState::default());
        let actor = Actor::new("u1", "s1");
        let reply = handle_message(
            request(
                "r1",
                ClientMessage::GetGame {
                    game_id: "ffffffffffff".into(),
                },
            ),
            &actor,
            &state,
        )
        .await;
        match reply {
            ServerMessage::Error {
                request_id, code, ..
            } => {
                assert_eq!(request_id.as_deref(), Some("r1"));
                assert_eq!(code, "NOT_FOUND");
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_then_subscribe() {
        let state = Arc::new(AppState::default());
        let actor = Actor::new("u1", "s1");
        let created = handle_message(request("r1", ClientMessage::CreateGame), &actor, &state).await;
        let ServerMessage::GameCreated { game, .. } = created else {
            panic!("expected game_created");
        };
        assert_eq!(game.state, GameState::Start);

        let reply = handle_message(
            request("r2", ClientMessage::Subscribe { game_id: game.id.clone() }),
            &actor,
            &state,
        )
        .await;
        assert!(matches!(reply, ServerMessage::Subscribed { ref game_id, .. } if *game_id == game.id));
    }
}
