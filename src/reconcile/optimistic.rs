//! Optimistic local edits and their rollback.
//!
//! A mutation is a list of [`LocalPatch`]es. Applying a patch returns its
//! inverse, which is kept until the server confirms or rejects the
//! mutation. When an older mutation fails while a newer one on the same
//! key is still pending, the older inverse is handed to the newer one
//! instead of being applied, so the newer edit stays visible and a later
//! rollback of it restores the state from before both.

use super::local::LocalGame;
use crate::types::*;
use crate::views::{TeamView, WordView};
use std::collections::BTreeMap;

/// The piece of local state a patch writes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatchKey {
    GameState,
    Team(UserId),
    Word(WordId),
    WordDefinition(WordId),
    ProposalReady(WordId, UserId),
    GuessingReady(WordId, UserId),
    Vote(WordId),
}

/// A single overwrite of local state. `None` means absent.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalPatch {
    SetState(GameState),
    SetTeam {
        team_id: UserId,
        team: Option<TeamView>,
    },
    SetWord {
        word_id: WordId,
        word: Option<WordView>,
    },
    SetWordDefinition {
        word_id: WordId,
        definition: Option<String>,
    },
    SetProposalReady {
        word_id: WordId,
        team_id: UserId,
        ready: Option<bool>,
    },
    SetGuessingReady {
        word_id: WordId,
        team_id: UserId,
        ready: Option<bool>,
    },
    SetVote {
        word_id: WordId,
        vote: Option<MaskedId>,
    },
}

impl LocalPatch {
    pub fn key(&self) -> PatchKey {
        match self {
            LocalPatch::SetState(_) => PatchKey::GameState,
            LocalPatch::SetTeam { team_id, .. } => PatchKey::Team(team_id.clone()),
            LocalPatch::SetWord { word_id, .. } => PatchKey::Word(word_id.clone()),
            LocalPatch::SetWordDefinition { word_id, .. } => {
                PatchKey::WordDefinition(word_id.clone())
            }
            LocalPatch::SetProposalReady {
                word_id, team_id, ..
            } => PatchKey::ProposalReady(word_id.clone(), team_id.clone()),
            LocalPatch::SetGuessingReady {
                word_id, team_id, ..
            } => PatchKey::GuessingReady(word_id.clone(), team_id.clone()),
            LocalPatch::SetVote { word_id, .. } => PatchKey::Vote(word_id.clone()),
        }
    }

    /// Write the patch and return the patch that undoes it
    pub fn apply(self, game: &mut LocalGame) -> LocalPatch {
        match self {
            LocalPatch::SetState(state) => {
                LocalPatch::SetState(std::mem::replace(&mut game.state, state))
            }
            LocalPatch::SetTeam { team_id, team } => {
                let previous = put(&mut game.teams, team_id.clone(), team);
                LocalPatch::SetTeam {
                    team_id,
                    team: previous,
                }
            }
            LocalPatch::SetWord { word_id, word } => {
                let previous = put(&mut game.words, word_id.clone(), word);
                LocalPatch::SetWord {
                    word_id,
                    word: previous,
                }
            }
            LocalPatch::SetWordDefinition {
                word_id,
                definition,
            } => {
                let previous = match game.words.get_mut(&word_id) {
                    Some(word) => std::mem::replace(&mut word.definition, definition),
                    None => None,
                };
                LocalPatch::SetWordDefinition {
                    word_id,
                    definition: previous,
                }
            }
            LocalPatch::SetProposalReady {
                word_id,
                team_id,
                ready,
            } => {
                let per_word = game.proposal_readiness.entry(word_id.clone()).or_default();
                let previous = put(per_word, team_id.clone(), ready);
                LocalPatch::SetProposalReady {
                    word_id,
                    team_id,
                    ready: previous,
                }
            }
            LocalPatch::SetGuessingReady {
                word_id,
                team_id,
                ready,
            } => {
                let per_word = &mut game.guessing.entry(word_id.clone()).or_default().readiness;
                let previous = put(per_word, team_id.clone(), ready);
                LocalPatch::SetGuessingReady {
                    word_id,
                    team_id,
                    ready: previous,
                }
            }
            LocalPatch::SetVote { word_id, vote } => {
                let slot = &mut game.guessing.entry(word_id.clone()).or_default().vote;
                let previous = std::mem::replace(slot, vote);
                LocalPatch::SetVote {
                    word_id,
                    vote: previous,
                }
            }
        }
    }
}

fn put<V>(map: &mut BTreeMap<String, V>, key: String, value: Option<V>) -> Option<V> {
    match value {
        Some(v) => map.insert(key, v),
        None => map.remove(&key),
    }
}

/// Handle for one in-flight mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

#[derive(Debug, Clone)]
struct Tracked {
    key: PatchKey,
    inverse: LocalPatch,
}

#[derive(Debug, Default)]
pub struct PendingMutations {
    next_id: u64,
    in_flight: BTreeMap<MutationId, Vec<Tracked>>,
}

impl PendingMutations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation's patches and remember how to undo them
    pub fn begin(&mut self, game: &mut LocalGame, patches: Vec<LocalPatch>) -> MutationId {
        let id = MutationId(self.next_id);
        self.next_id += 1;

        let tracked = patches
            .into_iter()
            .map(|patch| Tracked {
                key: patch.key(),
                inverse: patch.apply(game),
            })
            .collect();
        self.in_flight.insert(id, tracked);
        id
    }

    /// Server accepted the mutation; its inverses are no longer needed
    pub fn confirm(&mut self, id: MutationId) -> bool {
        self.in_flight.remove(&id).is_some()
    }

    /// Server rejected the mutation. Returns how many patches were rolled
    /// back locally; the rest were handed to newer pending mutations.
    pub fn reject(&mut self, game: &mut LocalGame, id: MutationId) -> usize {
        let Some(tracked) = self.in_flight.remove(&id) else {
            return 0;
        };

        let mut reverted = 0;
        for Tracked { key, inverse } in tracked.into_iter().rev() {
            match self.newer_on_key(id, &key) {
                Some(slot) => *slot = inverse,
                None => {
                    inverse.apply(game);
                    reverted += 1;
                }
            }
        }
        reverted
    }

    pub fn is_pending(&self, id: MutationId) -> bool {
        self.in_flight.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Drop all pending inverses, e.g. after the local copy was replaced
    pub fn clear(&mut self) {
        self.in_flight.clear();
    }

    /// Earliest inverse on `key` recorded by a mutation newer than `id`
    fn newer_on_key(&mut self, id: MutationId, key: &PatchKey) -> Option<&mut LocalPatch> {
        self.in_flight
            .range_mut(MutationId(id.0 + 1)..)
            .flat_map(|(_, tracked)| tracked.iter_mut())
            .find(|t| &t.key == key)
            .map(|t| &mut t.inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::fixtures::sample;

    fn set_ready(team: &str, ready: bool) -> LocalPatch {
        LocalPatch::SetGuessingReady {
            word_id: "w0".into(),
            team_id: team.into(),
            ready: Some(ready),
        }
    }

    fn guessing_ready(game: &LocalGame, team: &str) -> Option<bool> {
        game.guessing
            .get("w0")
            .and_then(|g| g.readiness.get(team))
            .copied()
    }

    #[test]
    fn test_apply_returns_inverse() {
        let mut game = sample();
        let before = game.clone();
        let inverse = LocalPatch::SetTeam {
            team_id: "t2".into(),
            team: None,
        }
        .apply(&mut game);
        assert!(!game.teams.contains_key("t2"));

        inverse.apply(&mut game);
        assert_eq!(game, before);
    }

    #[test]
    fn test_confirmed_mutation_stays() {
        let mut game = sample();
        let mut pending = PendingMutations::new();
        let id = pending.begin(&mut game, vec![LocalPatch::SetState(GameState::Finish)]);
        assert!(pending.confirm(id));
        assert_eq!(game.state, GameState::Finish);
        assert!(pending.is_empty());
        assert!(!pending.confirm(id));
    }

    #[test]
    fn test_reject_restores_state() {
        let mut game = sample();
        let before = game.clone();
        let mut pending = PendingMutations::new();
        let id = pending.begin(
            &mut game,
            vec![
                LocalPatch::SetVote {
                    word_id: "w0".into(),
                    vote: Some("abcd".into()),
                },
                set_ready("t1", true),
            ],
        );
        assert_eq!(pending.reject(&mut game, id), 2);
        assert_eq!(game.guessing["w0"].vote, None);
        assert_eq!(guessing_ready(&game, "t1"), None);
        assert_eq!(game.teams, before.teams);
    }

    #[test]
    fn test_older_rejection_keeps_newer_edit() {
        let mut game = sample();
        let mut pending = PendingMutations::new();
        let older = pending.begin(&mut game, vec![set_ready("t1", true)]);
        let newer = pending.begin(&mut game, vec![set_ready("t1", false)]);

        assert_eq!(pending.reject(&mut game, older), 0);
        assert_eq!(guessing_ready(&game, "t1"), Some(false));

        assert_eq!(pending.reject(&mut game, newer), 1);
        assert_eq!(guessing_ready(&game, "t1"), None, "back to before both");
    }

    #[test]
    fn test_handoff_is_per_key() {
        let mut game = sample();
        let mut pending = PendingMutations::new();
        let older = pending.begin(
            &mut game,
            vec![set_ready("t1", true), LocalPatch::SetState(GameState::Finish)],
        );
        let _newer = pending.begin(&mut game, vec![set_ready("t1", false)]);

        assert_eq!(pending.reject(&mut game, older), 1);
        assert_eq!(game.state, GameState::Start);
        assert_eq!(guessing_ready(&game, "t1"), Some(false));
    }

    #[test]
    fn test_unknown_mutation_is_ignored() {
        let mut game = sample();
        let mut pending = PendingMutations::new();
        let id = pending.begin(&mut game, vec![]);
        pending.confirm(id);
        assert_eq!(pending.reject(&mut game, id), 0);
    }
}
