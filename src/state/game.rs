use super::AppState;
use crate::error::{GameError, GameResult};
use crate::phase;
use crate::protocol::Event;
use crate::types::*;
use crate::views::GameSummary;
use rand::Rng;

/// Random game id over [`GAME_ID_ALPHABET`]
pub fn generate_game_id() -> GameId {
    let mut rng = rand::rng();
    (0..GAME_ID_LENGTH)
        .map(|_| GAME_ID_ALPHABET[rng.random_range(0..GAME_ID_ALPHABET.len())] as char)
        .collect()
}

impl AppState {
    /// Create a new game owned by the caller
    pub async fn create_game(&self, actor: &Actor) -> Game {
        let mut store = self.store.write().await;
        let id = loop {
            let id = generate_game_id();
            if !store.games.contains_key(&id) {
                break id;
            }
        };

        let game = Game {
            id: id.clone(),
            owner_id: actor.user_id.clone(),
            state: GameState::Start,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.users.insert(actor.user_id.clone());
        store.games.insert(id, game.clone());

        tracing::info!(game_id = %game.id, owner = %game.owner_id, "Game created");
        game
    }

    /// Games owned by the caller, oldest first
    pub async fn list_games(&self, actor: &Actor) -> Vec<GameSummary> {
        let store = self.store.read().await;
        let mut games: Vec<&Game> = store
            .games
            .values()
            .filter(|g| g.owner_id == actor.user_id)
            .collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        games.into_iter().map(GameSummary::from).collect()
    }

    /// Leave the start phase.
    ///
    /// `team_ids` must be exactly the current team roster: a team joining
    /// or leaving after the owner looked makes the start fail.
    pub async fn start_game(
        &self,
        actor: &Actor,
        game_id: &str,
        team_ids: &[UserId],
    ) -> GameResult<GameState> {
        let mut store = self.store.write().await;
        let game = store.owned_game(game_id, &actor.user_id)?;
        if game.state != GameState::Start {
            return Err(GameError::precondition(format!(
                "Game cannot be started in the {} phase",
                game.state.phase()
            )));
        }

        let roster: Vec<UserId> = store
            .teams_of(game_id)
            .into_iter()
            .map(|t| t.user_id.clone())
            .collect();
        if roster.is_empty() {
            return Err(GameError::precondition("Game cannot be started without teams"));
        }
        let mut expected = team_ids.to_vec();
        expected.sort();
        if expected != roster {
            return Err(GameError::precondition("Team roster changed, refresh and retry"));
        }

        let next = phase::start_state(&store.sequencer(game_id))?;
        store.game_mut(game_id)?.state = next;

        tracing::info!(game_id = %game_id, teams = roster.len(), "Game started");
        self.emit(actor, game_id, Event::GameStart { team_ids: roster })
            .await;
        Ok(next)
    }

    pub async fn change_state(
        &self,
        actor: &Actor,
        game_id: &str,
        direction: Direction,
    ) -> GameResult<GameState> {
        let mut store = self.store.write().await;
        let current = store.owned_game(game_id, &actor.user_id)?.state;
        let next = phase::transition(current, direction, &store.sequencer(game_id))?;
        store.game_mut(game_id)?.state = next;

        tracing::info!(
            game_id = %game_id,
            from = %current.phase(),
            to = %next.phase(),
            "Phase changed"
        );
        self.emit(actor, game_id, Event::GameState { state: next })
            .await;
        Ok(next)
    }

    pub async fn change_position(
        &self,
        actor: &Actor,
        game_id: &str,
        direction: Direction,
    ) -> GameResult<GameState> {
        let mut store = self.store.write().await;
        let current = store.owned_game(game_id, &actor.user_id)?.state;
        let next = phase::advance_position(current, direction, &store.sequencer(game_id))?;
        store.game_mut(game_id)?.state = next;

        if let Some(current_position) = next.current_position() {
            tracing::debug!(game_id = %game_id, current_position, "Position changed");
            self.emit(
                actor,
                game_id,
                Event::GameCurrentPosition { current_position },
            )
            .await;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::protocol::EventKind;
    use crate::sequencer::SequencerError;

    #[test]
    fn test_generate_game_id() {
        let id = generate_game_id();
        assert_eq!(id.len(), GAME_ID_LENGTH);
        assert!(id.bytes().all(|b| GAME_ID_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn test_create_and_list_games() {
        let state = AppState::default();
        let owner = actor(OWNER);
        let a = state.create_game(&owner).await;
        let _other = state.create_game(&actor("someone")).await;

        let games = state.list_games(&owner).await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, a.id);
        assert_eq!(games[0].state, GameState::Start);
    }

    #[tokio::test]
    async fn test_start_lands_on_first_word() {
        let state = AppState::default();
        let game_id = game_with(&state, &["alpha", "beta", "gamma"], &["t1", "t2"]).await;
        let mut rx = state.broadcaster.subscribe(&game_id).await;

        let ids = vec!["t2".to_string(), "t1".to_string()];
        let next = state
            .start_game(&actor(OWNER), &game_id, &ids)
            .await
            .unwrap();
        assert_eq!(next, GameState::Proposal { current_position: 0 });

        let envelope = rx.recv().await.unwrap();
        assert_eq!(
            envelope.event,
            Event::GameStart {
                team_ids: vec!["t1".into(), "t2".into()]
            }
        );
        assert_eq!(envelope.session_id, actor(OWNER).session_id);
    }

    #[tokio::test]
    async fn test_start_rejects_stale_roster() {
        let state = AppState::default();
        let game_id = game_with(&state, &["alpha"], &["t1", "t2"]).await;

        let err = state
            .start_game(&actor(OWNER), &game_id, &["t1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));

        let store = state.store.read().await;
        assert_eq!(store.game(&game_id).unwrap().state, GameState::Start);
    }

    #[tokio::test]
    async fn test_start_requires_words_and_teams() {
        let state = AppState::default();
        let no_words = game_with(&state, &[], &["t1"]).await;
        let err = state
            .start_game(&actor(OWNER), &no_words, &["t1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Sequencer(SequencerError::Empty)));
        assert_eq!(err.code(), "NO_WORDS");

        let no_teams = game_with(&state, &["alpha"], &[]).await;
        let err = state
            .start_game(&actor(OWNER), &no_teams, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_only_owner_drives_the_game() {
        let state = AppState::default();
        let game_id = started_game(&state, &["alpha", "beta"], &["t1"]).await;

        let err = state
            .change_state(&actor("t1"), &game_id, Direction::Forward)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));

        let err = state
            .change_position(&actor("t1"), &game_id, Direction::Forward)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_walk_to_finish_and_back() {
        let state = AppState::default();
        let owner = actor(OWNER);
        let game_id = started_game(&state, &["alpha", "beta", "gamma"], &["t1"]).await;

        let s = state
            .change_position(&owner, &game_id, Direction::Forward)
            .await
            .unwrap();
        assert_eq!(s, GameState::Proposal { current_position: 1 });

        let s = state
            .change_state(&owner, &game_id, Direction::Forward)
            .await
            .unwrap();
        assert_eq!(s, GameState::Guessing { current_position: 0 });

        let s = state
            .change_state(&owner, &game_id, Direction::Forward)
            .await
            .unwrap();
        assert_eq!(s, GameState::Finish);

        let err = state
            .change_position(&owner, &game_id, Direction::Forward)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));

        let s = state
            .change_state(&owner, &game_id, Direction::Backward)
            .await
            .unwrap();
        assert_eq!(s, GameState::Guessing { current_position: 2 });
    }

    #[tokio::test]
    async fn test_position_boundary_leaves_state_untouched() {
        let state = AppState::default();
        let owner = actor(OWNER);
        let game_id = started_game(&state, &["alpha"], &["t1"]).await;
        let mut rx = state.broadcaster.subscribe(&game_id).await;

        let err = state
            .change_position(&owner, &game_id, Direction::Backward)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SEQUENCER_BOUNDARY");
        assert!(rx.try_recv().is_err());

        let s = state
            .change_state(&owner, &game_id, Direction::Forward)
            .await
            .unwrap();
        assert_eq!(s, GameState::Guessing { current_position: 0 });
        assert_eq!(rx.recv().await.unwrap().event.kind(), EventKind::GameState);
    }
}
