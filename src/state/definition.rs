//! Decoy submission, voting and the reveal.

use super::{validate_length, AppState, Store};
use crate::error::{GameError, GameResult};
use crate::mask::Masker;
use crate::protocol::Event;
use crate::types::*;

/// Resolve a word and check the caller is one of its game's teams
fn team_word(store: &Store, word_id: &str, user_id: &str) -> GameResult<(Word, Game)> {
    let word = store.word(word_id)?.clone();
    let game = store.game(&word.game_id)?.clone();
    store.team(&game.id, user_id)?;
    Ok((word, game))
}

/// Masked id -> real identity and vote, for every team plus the owner.
///
/// Fails when a team has no decoy or no vote for the word: by the time a
/// reveal is possible every team must have both.
fn build_reveal_map(
    store: &Store,
    masker: &Masker,
    game: &Game,
    word: &Word,
) -> GameResult<RevealMap> {
    let mut mapping = RevealMap::new();
    mapping.insert(
        masker.mask(&game.owner_id, &game.id, &word.id),
        RevealEntry {
            id: game.owner_id.clone(),
            vote: None,
        },
    );

    for team in store.teams_of(&game.id) {
        let row = store.definition(&word.id, &team.user_id);
        if row.and_then(|d| d.definition.as_ref()).is_none() {
            return Err(GameError::invariant(format!(
                "team {} has no decoy for word {}",
                team.user_id, word.id
            )));
        }
        let guess = row
            .and_then(|d| d.guess_user_id.clone())
            .ok_or_else(|| {
                GameError::invariant(format!(
                    "team {} has no vote for word {}",
                    team.user_id, word.id
                ))
            })?;
        let vote = (guess != game.owner_id).then_some(guess);
        mapping.insert(
            masker.mask(&team.user_id, &game.id, &word.id),
            RevealEntry {
                id: team.user_id.clone(),
                vote,
            },
        );
    }
    Ok(mapping)
}

impl AppState {
    /// Submit, replace or clear (`None`) the caller's decoy for a word
    pub async fn put_definition(
        &self,
        actor: &Actor,
        word_id: &str,
        definition: Option<&str>,
    ) -> GameResult<()> {
        if let Some(text) = definition {
            validate_length(
                "Definition",
                text,
                MIN_DEFINITION_LENGTH,
                MAX_DEFINITION_LENGTH,
            )?;
        }

        let mut store = self.store.write().await;
        let (word, game) = team_word(&store, word_id, &actor.user_id)?;
        if game.state.phase() != Phase::Proposal {
            return Err(GameError::precondition(format!(
                "Definitions cannot be submitted in the {} phase",
                game.state.phase()
            )));
        }
        if word.revealed {
            return Err(GameError::precondition("Word has already been revealed"));
        }

        let key = (word.id.clone(), actor.user_id.clone());
        let row = store.definitions.entry(key).or_insert_with(|| Definition {
            word_id: word.id.clone(),
            user_id: actor.user_id.clone(),
            definition: None,
            guess_user_id: None,
        });
        let was_ready = row.definition.is_some();
        row.definition = definition.map(str::to_string);
        let ready = row.definition.is_some();

        if was_ready != ready {
            self.emit(
                actor,
                &game.id,
                Event::DefinitionReady {
                    word_id: word.id,
                    team_id: actor.user_id.clone(),
                    ready,
                },
            )
            .await;
        }
        Ok(())
    }

    /// Cast or change the caller's vote. `guess` is a masked id taken from
    /// the guessing view; the owner's masked id stands for the real definition.
    pub async fn vote(&self, actor: &Actor, word_id: &str, guess: &str) -> GameResult<()> {
        let mut store = self.store.write().await;
        let (word, game) = team_word(&store, word_id, &actor.user_id)?;

        let GameState::Guessing { current_position } = game.state else {
            return Err(GameError::precondition(format!(
                "Votes cannot be cast in the {} phase",
                game.state.phase()
            )));
        };
        if word.position < current_position {
            return Err(GameError::precondition(
                "Votes on words before the current one are closed",
            ));
        }
        if word.revealed {
            return Err(GameError::precondition("Word has already been revealed"));
        }

        let target = self.masker.unmask_scoped(guess, &game.id)?;
        if target.word_id != word.id {
            return Err(GameError::invalid("Masked id belongs to another word"));
        }
        if target.identity == actor.user_id {
            return Err(GameError::invalid("You cannot vote for your own definition"));
        }
        if target.identity != game.owner_id && !store.is_team(&game.id, &target.identity) {
            return Err(GameError::invalid("Masked id does not name a participant"));
        }

        let row = store
            .definitions
            .get_mut(&(word.id.clone(), actor.user_id.clone()))
            .filter(|d| d.definition.is_some())
            .ok_or_else(|| {
                GameError::precondition("You cannot vote on a word you submitted no definition for")
            })?;
        row.guess_user_id = Some(target.identity);

        self.emit(
            actor,
            &game.id,
            Event::GuessingReady {
                word_id: word.id,
                team_id: actor.user_id.clone(),
                ready: true,
            },
        )
        .await;
        Ok(())
    }

    /// Disclose who wrote what and who voted for whom. The first reveal
    /// freezes the mapping; repeating it returns the frozen one.
    pub async fn reveal(&self, actor: &Actor, word_id: &str) -> GameResult<RevealMap> {
        let mut store = self.store.write().await;
        let word = store.word(word_id)?.clone();
        let game = store.owned_game(&word.game_id, &actor.user_id)?.clone();
        if !matches!(game.state.phase(), Phase::Guessing | Phase::Finish) {
            return Err(GameError::precondition(format!(
                "Words cannot be revealed in the {} phase",
                game.state.phase()
            )));
        }

        let mapping = match store.reveals.get(word_id) {
            Some(frozen) => frozen.clone(),
            None => {
                let mapping = match build_reveal_map(&store, &self.masker, &game, &word) {
                    Ok(mapping) => mapping,
                    Err(err) => {
                        tracing::error!(game_id = %game.id, word_id = %word.id, error = %err, "Reveal failed");
                        return Err(err);
                    }
                };
                store.reveals.insert(word.id.clone(), mapping.clone());
                if let Some(w) = store.words.get_mut(word_id) {
                    w.revealed = true;
                }
                mapping
            }
        };

        tracing::info!(game_id = %game.id, word_id = %word.id, slots = mapping.len(), "Word revealed");
        self.emit(
            actor,
            &game.id,
            Event::GuessingReveal {
                word_id: word.id,
                mapping: mapping.clone(),
            },
        )
        .await;
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::protocol::EventKind;

    /// Started game, walked into guessing with every team's decoy in place
    async fn guessing_game(state: &AppState, teams: &[&str]) -> (GameId, WordId) {
        let game_id = started_game(state, &["alpha", "beta"], teams).await;
        let word_id = word_ids(state, &game_id).await.remove(0);
        for team in teams {
            state
                .put_definition(&actor(team), &word_id, Some(format!("{team} decoy").as_str()))
                .await
                .unwrap();
        }
        state
            .change_state(&actor(OWNER), &game_id, Direction::Forward)
            .await
            .unwrap();
        (game_id, word_id)
    }

    #[tokio::test]
    async fn test_definition_ready_only_on_flip() {
        let state = AppState::default();
        let game_id = started_game(&state, &["alpha"], &["t1"]).await;
        let word_id = word_ids(&state, &game_id).await.remove(0);
        let mut rx = state.broadcaster.subscribe(&game_id).await;
        let t1 = actor("t1");

        state.put_definition(&t1, &word_id, Some("first")).await.unwrap();
        state.put_definition(&t1, &word_id, Some("second")).await.unwrap();
        state.put_definition(&t1, &word_id, None).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.event,
            Event::DefinitionReady {
                word_id: word_id.clone(),
                team_id: "t1".into(),
                ready: true
            }
        );
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.event, Event::DefinitionReady { ready: false, .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_definitions_only_in_proposal() {
        let state = AppState::default();
        let (_game_id, word_id) = guessing_game(&state, &["t1"]).await;
        let err = state
            .put_definition(&actor("t1"), &word_id, Some("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));

        let err = state
            .put_definition(&actor("stranger"), &word_id, Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_vote_stores_real_identity() {
        let state = AppState::default();
        let (game_id, word_id) = guessing_game(&state, &["t1", "t2"]).await;
        let guess = state.masker.mask("t2", &game_id, &word_id);

        state.vote(&actor("t1"), &word_id, &guess).await.unwrap();
        let store = state.store.read().await;
        let row = store.definition(&word_id, "t1").unwrap();
        assert_eq!(row.guess_user_id.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_vote_rejects_foreign_tokens() {
        let state = AppState::default();
        let (game_id, word_id) = guessing_game(&state, &["t1", "t2"]).await;
        let t1 = actor("t1");

        let other_word = word_ids(&state, &game_id).await.remove(1);
        let token = state.masker.mask("t2", &game_id, &other_word);
        let err = state.vote(&t1, &word_id, &token).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let own = state.masker.mask("t1", &game_id, &word_id);
        assert!(state.vote(&t1, &word_id, &own).await.is_err());

        let stranger = state.masker.mask("stranger", &game_id, &word_id);
        assert!(state.vote(&t1, &word_id, &stranger).await.is_err());

        let err = state.vote(&t1, &word_id, "zz").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_vote_closed_for_passed_words() {
        let state = AppState::default();
        let (game_id, word_id) = guessing_game(&state, &["t1", "t2"]).await;
        state
            .change_position(&actor(OWNER), &game_id, Direction::Forward)
            .await
            .unwrap();

        let guess = state.masker.mask(OWNER, &game_id, &word_id);
        let err = state.vote(&actor("t1"), &word_id, &guess).await.unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_reveal_maps_every_participant() {
        let state = AppState::default();
        let (game_id, word_id) = guessing_game(&state, &["t1", "t2"]).await;
        let mut rx = state.broadcaster.subscribe(&game_id).await;

        let real = state.masker.mask(OWNER, &game_id, &word_id);
        let t1_token = state.masker.mask("t1", &game_id, &word_id);
        state.vote(&actor("t1"), &word_id, &real).await.unwrap();
        state.vote(&actor("t2"), &word_id, &t1_token).await.unwrap();

        let mapping = state.reveal(&actor(OWNER), &word_id).await.unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping[&real].id, OWNER);
        assert_eq!(mapping[&real].vote, None);
        assert_eq!(mapping[&t1_token].vote, None, "t1 found the real one");
        let t2_token = state.masker.mask("t2", &game_id, &word_id);
        assert_eq!(mapping[&t2_token].vote.as_deref(), Some("t1"));

        let kinds: Vec<EventKind> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .map(|e| e.event.kind())
        .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::GuessingReady,
                EventKind::GuessingReady,
                EventKind::GuessingReveal
            ]
        );

        let again = state.reveal(&actor(OWNER), &word_id).await.unwrap();
        assert_eq!(again, mapping);

        let err = state
            .vote(&actor("t1"), &word_id, &t1_token)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_reveal_survives_a_restart_with_a_new_team() {
        let state = AppState::default();
        let owner = actor(OWNER);
        let (game_id, word_id) = guessing_game(&state, &["t1", "t2"]).await;
        let real = state.masker.mask(OWNER, &game_id, &word_id);
        state.vote(&actor("t1"), &word_id, &real).await.unwrap();
        state.vote(&actor("t2"), &word_id, &real).await.unwrap();
        let mapping = state.reveal(&owner, &word_id).await.unwrap();

        for _ in 0..2 {
            state
                .change_state(&owner, &game_id, Direction::Backward)
                .await
                .unwrap();
        }
        state.join_team(&actor("t3"), &game_id, "late team").await.unwrap();
        state
            .start_game(&owner, &game_id, &["t1".into(), "t2".into(), "t3".into()])
            .await
            .unwrap();
        state
            .change_state(&owner, &game_id, Direction::Forward)
            .await
            .unwrap();

        assert_eq!(state.reveal(&owner, &word_id).await.unwrap(), mapping);

        let admin = state.admin_guessing(&owner, &game_id).await.unwrap();
        assert_eq!(admin[&word_id].reveal_map.as_ref(), Some(&mapping));
        let player = state.player_guessing(&actor("t3"), &game_id).await.unwrap();
        assert_eq!(player[&word_id].reveal_map.as_ref(), Some(&mapping));
        assert!(!mapping.values().any(|e| e.id == "t3"));
    }

    #[tokio::test]
    async fn test_reveal_with_missing_vote_is_a_defect() {
        let state = AppState::default();
        let (game_id, word_id) = guessing_game(&state, &["t1", "t2"]).await;
        let real = state.masker.mask(OWNER, &game_id, &word_id);
        state.vote(&actor("t1"), &word_id, &real).await.unwrap();

        let err = state.reveal(&actor(OWNER), &word_id).await.unwrap_err();
        assert!(err.is_defect());
        let store = state.store.read().await;
        assert!(!store.word(&word_id).unwrap().revealed);
    }

    #[tokio::test]
    async fn test_reveal_is_owner_only_and_needs_guessing() {
        let state = AppState::default();
        let game_id = started_game(&state, &["alpha"], &["t1"]).await;
        let word_id = word_ids(&state, &game_id).await.remove(0);

        let err = state.reveal(&actor(OWNER), &word_id).await.unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));
        let err = state.reveal(&actor("t1"), &word_id).await.unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));
    }
}
