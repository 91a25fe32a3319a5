use super::{validate_length, AppState, Store};
use crate::error::{GameError, GameResult};
use crate::protocol::Event;
use crate::types::*;

fn validate_term(term: &str) -> GameResult<()> {
    validate_length("Term", term, MIN_TERM_LENGTH, MAX_TERM_LENGTH)
}

/// The owner's definition may be blank while the word list is drafted
fn validate_real_definition(definition: &str) -> GameResult<()> {
    validate_length("Definition", definition, 0, MAX_DEFINITION_LENGTH)
}

/// Resolve a word for editing: caller owns its game and the game is in start
fn editable_word(store: &Store, word_id: &str, user_id: &str) -> GameResult<GameId> {
    let game_id = store.word(word_id)?.game_id.clone();
    let game = store.owned_game(&game_id, user_id)?;
    if game.state != GameState::Start {
        return Err(GameError::precondition(format!(
            "Words cannot be edited in the {} phase",
            game.state.phase()
        )));
    }
    Ok(game_id)
}

impl AppState {
    /// Append a word after the current last one
    pub async fn put_word(
        &self,
        actor: &Actor,
        game_id: &str,
        term: &str,
        definition: &str,
    ) -> GameResult<Word> {
        validate_term(term)?;
        validate_real_definition(definition)?;

        let mut store = self.store.write().await;
        let game = store.owned_game(game_id, &actor.user_id)?;
        if game.state != GameState::Start {
            return Err(GameError::precondition(format!(
                "Words cannot be added in the {} phase",
                game.state.phase()
            )));
        }

        let word = Word {
            id: ulid::Ulid::new().to_string(),
            game_id: game_id.to_string(),
            term: term.to_string(),
            definition: definition.to_string(),
            position: store.sequencer(game_id).next_free_position(),
            revealed: false,
        };
        store.words.insert(word.id.clone(), word.clone());

        tracing::debug!(game_id = %game_id, word_id = %word.id, position = word.position, "Word added");
        self.emit(
            actor,
            game_id,
            Event::WordAdd {
                id: word.id.clone(),
                position: word.position,
                term: word.term.clone(),
            },
        )
        .await;
        Ok(word)
    }

    pub async fn remove_word(&self, actor: &Actor, word_id: &str) -> GameResult<()> {
        let mut store = self.store.write().await;
        let game_id = editable_word(&store, word_id, &actor.user_id)?;

        store.words.remove(word_id);
        store.definitions.retain(|(w, _), _| w != word_id);
        store.reveals.remove(word_id);

        tracing::debug!(game_id = %game_id, word_id = %word_id, "Word removed");
        self.emit(
            actor,
            &game_id,
            Event::WordRemove {
                id: word_id.to_string(),
            },
        )
        .await;
        Ok(())
    }

    pub async fn change_term(&self, actor: &Actor, word_id: &str, term: &str) -> GameResult<()> {
        validate_term(term)?;
        let mut store = self.store.write().await;
        let game_id = editable_word(&store, word_id, &actor.user_id)?;
        if let Some(word) = store.words.get_mut(word_id) {
            word.term = term.to_string();
        }

        self.emit(
            actor,
            &game_id,
            Event::WordTermUpdate {
                word_id: word_id.to_string(),
                term: term.to_string(),
            },
        )
        .await;
        Ok(())
    }

    /// Change the real definition. Not broadcast: only the owner may see it.
    pub async fn change_definition(
        &self,
        actor: &Actor,
        word_id: &str,
        definition: &str,
    ) -> GameResult<()> {
        validate_real_definition(definition)?;
        let mut store = self.store.write().await;
        editable_word(&store, word_id, &actor.user_id)?;
        if let Some(word) = store.words.get_mut(word_id) {
            word.definition = definition.to_string();
        }
        Ok(())
    }
}
