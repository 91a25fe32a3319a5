use super::{validate_length, AppState, Store};
use crate::error::{GameError, GameResult};
use crate::protocol::Event;
use crate::types::*;

/// Team roster and team settings only change before the game starts
fn require_start_phase(store: &Store, game_id: &str) -> GameResult<()> {
    let game = store.game(game_id)?;
    if game.state != GameState::Start {
        return Err(GameError::precondition(format!(
            "Teams cannot change in the {} phase",
            game.state.phase()
        )));
    }
    Ok(())
}

fn validate_nickname(nickname: &str) -> GameResult<()> {
    validate_length("Nickname", nickname, MIN_NICKNAME_LENGTH, MAX_NICKNAME_LENGTH)
}

impl AppState {
    pub async fn join_team(&self, actor: &Actor, game_id: &str, nickname: &str) -> GameResult<Team> {
        validate_nickname(nickname)?;
        let mut store = self.store.write().await;
        require_start_phase(&store, game_id)?;

        if store.game(game_id)?.owner_id == actor.user_id {
            return Err(GameError::forbidden("The game owner cannot join as a team"));
        }
        if store.is_team(game_id, &actor.user_id) {
            return Err(GameError::precondition("You are already in this game"));
        }

        let team = Team {
            game_id: game_id.to_string(),
            user_id: actor.user_id.clone(),
            nickname: nickname.to_string(),
            ready: false,
        };
        store.users.insert(actor.user_id.clone());
        store
            .teams
            .insert((game_id.to_string(), actor.user_id.clone()), team.clone());

        tracing::info!(game_id = %game_id, team = %actor.user_id, "Team joined");
        self.emit(
            actor,
            game_id,
            Event::TeamJoin {
                user_id: team.user_id.clone(),
                nickname: team.nickname.clone(),
            },
        )
        .await;
        Ok(team)
    }

    pub async fn leave_team(&self, actor: &Actor, game_id: &str) -> GameResult<()> {
        let mut store = self.store.write().await;
        require_start_phase(&store, game_id)?;
        store.team(game_id, &actor.user_id)?;
        remove_team(&mut store, game_id, &actor.user_id);

        tracing::info!(game_id = %game_id, team = %actor.user_id, "Team left");
        self.emit(
            actor,
            game_id,
            Event::TeamLeave {
                user_id: actor.user_id.clone(),
            },
        )
        .await;
        Ok(())
    }

    /// Owner removes a team
    pub async fn kick_team(&self, actor: &Actor, game_id: &str, team_id: &str) -> GameResult<()> {
        let mut store = self.store.write().await;
        store.owned_game(game_id, &actor.user_id)?;
        require_start_phase(&store, game_id)?;
        if !store.is_team(game_id, team_id) {
            return Err(GameError::not_found(format!("Team {team_id} not found")));
        }
        remove_team(&mut store, game_id, team_id);

        tracing::info!(game_id = %game_id, team = %team_id, "Team kicked");
        self.emit(
            actor,
            game_id,
            Event::TeamLeave {
                user_id: team_id.to_string(),
            },
        )
        .await;
        Ok(())
    }

    pub async fn change_readiness(&self, actor: &Actor, game_id: &str, ready: bool) -> GameResult<()> {
        let mut store = self.store.write().await;
        require_start_phase(&store, game_id)?;
        team_mut(&mut store, game_id, &actor.user_id)?.ready = ready;

        self.emit(
            actor,
            game_id,
            Event::TeamReadiness {
                user_id: actor.user_id.clone(),
                ready,
            },
        )
        .await;
        Ok(())
    }

    pub async fn change_nickname(&self, actor: &Actor, game_id: &str, nickname: &str) -> GameResult<()> {
        validate_nickname(nickname)?;
        let mut store = self.store.write().await;
        require_start_phase(&store, game_id)?;
        team_mut(&mut store, game_id, &actor.user_id)?.nickname = nickname.to_string();

        self.emit(
            actor,
            game_id,
            Event::TeamNickname {
                user_id: actor.user_id.clone(),
                nickname: nickname.to_string(),
            },
        )
        .await;
        Ok(())
    }
}

fn team_mut<'a>(store: &'a mut Store, game_id: &str, user_id: &str) -> GameResult<&'a mut Team> {
    store
        .teams
        .get_mut(&(game_id.to_string(), user_id.to_string()))
        .ok_or_else(|| GameError::forbidden("You don't participate in this game"))
}

/// Drop a team along with anything it wrote in this game
fn remove_team(store: &mut Store, game_id: &str, user_id: &str) {
    store
        .teams
        .remove(&(game_id.to_string(), user_id.to_string()));
    let words = &store.words;
    store
        .definitions
        .retain(|(word_id, team), _| {
            team != user_id || words.get(word_id).map_or(true, |w| w.game_id != game_id)
        });
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::protocol::EventKind;

    #[tokio::test]
    async fn test_join_and_leave() {
        let state = AppState::default();
        let game_id = game_with(&state, &["alpha"], &[]).await;
        let mut rx = state.broadcaster.subscribe(&game_id).await;

        let team = state.join_team(&actor("t1"), &game_id, "Owls").await.unwrap();
        assert!(!team.ready);
        assert_eq!(
            rx.recv().await.unwrap().event,
            Event::TeamJoin {
                user_id: "t1".into(),
                nickname: "Owls".into()
            }
        );

        let err = state
            .join_team(&actor("t1"), &game_id, "Owls again")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));

        state.leave_team(&actor("t1"), &game_id).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().event.kind(), EventKind::TeamLeave);
        assert!(state.store.read().await.teams_of(&game_id).is_empty());
    }

    #[tokio::test]
    async fn test_owner_cannot_join() {
        let state = AppState::default();
        let game_id = game_with(&state, &[], &[]).await;
        let err = state
            .join_team(&actor(OWNER), &game_id, "Boss")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_nickname_bounds() {
        let state = AppState::default();
        let game_id = game_with(&state, &[], &[]).await;
        let err = state.join_team(&actor("t1"), &game_id, "x").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let long = "n".repeat(MAX_NICKNAME_LENGTH + 1);
        assert!(state.join_team(&actor("t1"), &game_id, &long).await.is_err());
    }

    #[tokio::test]
    async fn test_roster_frozen_after_start() {
        let state = AppState::default();
        let game_id = started_game(&state, &["alpha"], &["t1"]).await;

        for result in [
            state.join_team(&actor("late"), &game_id, "Late").await.map(|_| ()),
            state.leave_team(&actor("t1"), &game_id).await,
            state.change_readiness(&actor("t1"), &game_id, true).await,
            state.change_nickname(&actor("t1"), &game_id, "New name").await,
            state.kick_team(&actor(OWNER), &game_id, "t1").await,
        ] {
            assert!(matches!(result, Err(GameError::PreconditionFailed(_))));
        }
    }

    #[tokio::test]
    async fn test_kick_is_owner_only() {
        let state = AppState::default();
        let game_id = game_with(&state, &[], &["t1", "t2"]).await;

        let err = state
            .kick_team(&actor("t2"), &game_id, "t1")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));

        state.kick_team(&actor(OWNER), &game_id, "t1").await.unwrap();
        let store = state.store.read().await;
        assert!(!store.is_team(&game_id, "t1"));
        assert!(store.is_team(&game_id, "t2"));
    }

    #[tokio::test]
    async fn test_readiness_and_nickname() {
        let state = AppState::default();
        let game_id = game_with(&state, &[], &["t1"]).await;
        let t1 = actor("t1");

        state.change_readiness(&t1, &game_id, true).await.unwrap();
        state.change_nickname(&t1, &game_id, "Herons").await.unwrap();

        let store = state.store.read().await;
        let team = store.team(&game_id, "t1").unwrap();
        assert!(team.ready);
        assert_eq!(team.nickname, "Herons");

        drop(store);
        let err = state
            .change_readiness(&actor("stranger"), &game_id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));
    }
}
