use super::{AppState, Store};
use crate::error::{GameError, GameResult};
use crate::types::*;
use crate::views::*;
use std::collections::BTreeMap;

fn require_guessing_or_later(game: &Game) -> GameResult<()> {
    match game.state.phase() {
        Phase::Guessing | Phase::Finish => Ok(()),
        phase => Err(GameError::precondition(format!(
            "Guessing data is not available in the {phase} phase"
        ))),
    }
}

fn decoy<'a>(store: &'a Store, word_id: &str, user_id: &str) -> Option<&'a String> {
    store
        .definition(word_id, user_id)
        .and_then(|d| d.definition.as_ref())
}

fn guess<'a>(store: &'a Store, word_id: &str, user_id: &str) -> Option<&'a UserId> {
    store
        .definition(word_id, user_id)
        .and_then(|d| d.guess_user_id.as_ref())
}

impl AppState {
    /// Game snapshot for the caller. Anyone may look; only the owner sees
    /// the real definitions, a team sees its own decoys.
    pub async fn get_game(&self, actor: &Actor, game_id: &str) -> GameResult<GameSnapshot> {
        let store = self.store.read().await;
        let game = store.game(game_id)?;
        let is_owner = game.owner_id == actor.user_id;

        let teams = store
            .teams_of(game_id)
            .into_iter()
            .map(|t| {
                (
                    t.user_id.clone(),
                    TeamView {
                        nickname: t.nickname.clone(),
                        ready: t.ready,
                    },
                )
            })
            .collect();
        let words = store
            .words_of(game_id)
            .into_iter()
            .map(|w| {
                let definition = if is_owner {
                    Some(w.definition.clone())
                } else {
                    decoy(&store, &w.id, &actor.user_id).cloned()
                };
                (
                    w.id.clone(),
                    WordView {
                        position: w.position,
                        term: w.term.clone(),
                        definition,
                    },
                )
            })
            .collect();

        Ok(GameSnapshot {
            id: game.id.clone(),
            state: game.state,
            is_owner,
            teams,
            words,
        })
    }

    /// Proposal data for a team: its own decoys, and which other teams are done
    pub async fn player_definitions(
        &self,
        actor: &Actor,
        game_id: &str,
    ) -> GameResult<BTreeMap<WordId, PlayerProposalView>> {
        let store = self.store.read().await;
        store.team(game_id, &actor.user_id)?;
        let teams = store.teams_of(game_id);

        Ok(store
            .words_of(game_id)
            .into_iter()
            .map(|w| {
                let readiness = teams
                    .iter()
                    .filter(|t| t.user_id != actor.user_id)
                    .map(|t| (t.user_id.clone(), decoy(&store, &w.id, &t.user_id).is_some()))
                    .collect();
                let view = PlayerProposalView {
                    definition: decoy(&store, &w.id, &actor.user_id).cloned(),
                    readiness,
                };
                (w.id.clone(), view)
            })
            .collect())
    }

    /// Proposal data for the owner: per word, which teams submitted a decoy
    pub async fn admin_definitions(
        &self,
        actor: &Actor,
        game_id: &str,
    ) -> GameResult<BTreeMap<WordId, AdminProposalView>> {
        let store = self.store.read().await;
        store.owned_game(game_id, &actor.user_id)?;
        let teams = store.teams_of(game_id);

        Ok(store
            .words_of(game_id)
            .into_iter()
            .map(|w| {
                let readiness = teams
                    .iter()
                    .map(|t| (t.user_id.clone(), decoy(&store, &w.id, &t.user_id).is_some()))
                    .collect();
                (w.id.clone(), readiness)
            })
            .collect())
    }

    /// Guessing data for a team. Authors are masked; the caller's own decoy
    /// is left out so it cannot be picked.
    pub async fn player_guessing(
        &self,
        actor: &Actor,
        game_id: &str,
    ) -> GameResult<BTreeMap<WordId, PlayerGuessingView>> {
        let store = self.store.read().await;
        store.team(game_id, &actor.user_id)?;
        let game = store.game(game_id)?;
        require_guessing_or_later(game)?;
        let teams = store.teams_of(game_id);

        let mut out = BTreeMap::new();
        for word in store.words_of(game_id) {
            let mut definitions = BTreeMap::new();
            definitions.insert(
                self.masker.mask(&game.owner_id, game_id, &word.id),
                word.definition.clone(),
            );
            for team in teams.iter().filter(|t| t.user_id != actor.user_id) {
                if let Some(text) = decoy(&store, &word.id, &team.user_id) {
                    definitions.insert(
                        self.masker.mask(&team.user_id, game_id, &word.id),
                        text.clone(),
                    );
                }
            }

            let view = PlayerGuessingView {
                definitions,
                vote: guess(&store, &word.id, &actor.user_id)
                    .map(|target| self.masker.mask(target, game_id, &word.id)),
                readiness: teams
                    .iter()
                    .map(|t| (t.user_id.clone(), guess(&store, &word.id, &t.user_id).is_some()))
                    .collect(),
                reveal_map: store.reveals.get(&word.id).cloned(),
            };
            out.insert(word.id.clone(), view);
        }
        Ok(out)
    }

    /// Guessing data for the owner, unmasked
    pub async fn admin_guessing(
        &self,
        actor: &Actor,
        game_id: &str,
    ) -> GameResult<BTreeMap<WordId, AdminGuessingView>> {
        let store = self.store.read().await;
        let game = store.owned_game(game_id, &actor.user_id)?;
        require_guessing_or_later(game)?;
        let teams = store.teams_of(game_id);

        let mut out = BTreeMap::new();
        for word in store.words_of(game_id) {
            let view = AdminGuessingView {
                original_definition: word.definition.clone(),
                definitions: teams
                    .iter()
                    .filter_map(|t| {
                        decoy(&store, &word.id, &t.user_id).map(|d| (t.user_id.clone(), d.clone()))
                    })
                    .collect(),
                readiness: teams
                    .iter()
                    .map(|t| (t.user_id.clone(), guess(&store, &word.id, &t.user_id).is_some()))
                    .collect(),
                reveal_map: store.reveals.get(&word.id).cloned(),
            };
            out.insert(word.id.clone(), view);
        }
        Ok(out)
    }
}
