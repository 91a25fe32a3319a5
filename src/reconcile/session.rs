use super::local::{ApplyOutcome, LocalGame};
use super::optimistic::{LocalPatch, MutationId, PendingMutations};
use super::reconciler::{Admission, Reconciler};
use crate::phase;
use crate::protocol::EventEnvelope;
use crate::types::*;
use crate::views::{GameSnapshot, TeamView, WordView};

/// A mutation as the client issues it, before the server answers
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start,
    ChangeState(Direction),
    ChangePosition(Direction),
    ChangeReadiness(bool),
    ChangeNickname(String),
    Leave,
    Kick(UserId),
    RemoveWord(WordId),
    ChangeTerm { word_id: WordId, term: String },
    PutDefinition { word_id: WordId, definition: Option<String> },
    Vote { word_id: WordId, guess: MaskedId },
}

/// What happened to an incoming envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    OwnSession,
    Stale,
    Applied,
    Ignored,
    NeedsRefetch,
}

/// One client connection's view of a game: the local copy, its pending
/// optimistic edits and the realtime event filter
#[derive(Debug)]
pub struct ClientSession {
    game: LocalGame,
    reconciler: Reconciler,
    pending: PendingMutations,
    needs_refetch: bool,
}

impl ClientSession {
    pub fn new(session_id: impl Into<SessionId>, game: LocalGame) -> Self {
        Self {
            game,
            reconciler: Reconciler::new(session_id),
            pending: PendingMutations::new(),
            needs_refetch: false,
        }
    }

    pub fn game(&self) -> &LocalGame {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut LocalGame {
        &mut self.game
    }

    pub fn session_id(&self) -> &SessionId {
        self.reconciler.session_id()
    }

    /// Set once an event could not be reconciled; cleared by [`Self::resync`]
    pub fn needs_refetch(&self) -> bool {
        self.needs_refetch
    }

    pub fn pending_mutations(&self) -> usize {
        self.pending.len()
    }

    /// Patches that make the local copy look as if `action` had succeeded.
    /// Empty when the outcome cannot be predicted.
    pub fn predict(&self, action: &Action) -> Vec<LocalPatch> {
        let game = &self.game;
        let seq = game.sequencer();
        match action {
            Action::Start => phase::start_state(&seq)
                .ok()
                .map(LocalPatch::SetState)
                .into_iter()
                .collect(),
            Action::ChangeState(direction) => phase::transition(game.state, *direction, &seq)
                .ok()
                .map(LocalPatch::SetState)
                .into_iter()
                .collect(),
            Action::ChangePosition(direction) => {
                phase::advance_position(game.state, *direction, &seq)
                    .ok()
                    .map(LocalPatch::SetState)
                    .into_iter()
                    .collect()
            }
            Action::ChangeReadiness(ready) => self
                .own_team()
                .map(|team| LocalPatch::SetTeam {
                    team_id: game.self_id.clone(),
                    team: Some(TeamView {
                        ready: *ready,
                        ..team.clone()
                    }),
                })
                .into_iter()
                .collect(),
            Action::ChangeNickname(nickname) => self
                .own_team()
                .map(|team| LocalPatch::SetTeam {
                    team_id: game.self_id.clone(),
                    team: Some(TeamView {
                        nickname: nickname.clone(),
                        ready: team.ready,
                    }),
                })
                .into_iter()
                .collect(),
            Action::Leave => vec![LocalPatch::SetTeam {
                team_id: game.self_id.clone(),
                team: None,
            }],
            Action::Kick(team_id) => vec![LocalPatch::SetTeam {
                team_id: team_id.clone(),
                team: None,
            }],
            Action::RemoveWord(word_id) => vec![LocalPatch::SetWord {
                word_id: word_id.clone(),
                word: None,
            }],
            Action::ChangeTerm { word_id, term } => game
                .words
                .get(word_id)
                .map(|word| LocalPatch::SetWord {
                    word_id: word_id.clone(),
                    word: Some(WordView {
                        term: term.clone(),
                        ..word.clone()
                    }),
                })
                .into_iter()
                .collect(),
            Action::PutDefinition {
                word_id,
                definition,
            } => vec![
                LocalPatch::SetWordDefinition {
                    word_id: word_id.clone(),
                    definition: definition.clone(),
                },
                LocalPatch::SetProposalReady {
                    word_id: word_id.clone(),
                    team_id: game.self_id.clone(),
                    ready: Some(definition.is_some()),
                },
            ],
            Action::Vote { word_id, guess } => vec![
                LocalPatch::SetVote {
                    word_id: word_id.clone(),
                    vote: Some(guess.clone()),
                },
                LocalPatch::SetGuessingReady {
                    word_id: word_id.clone(),
                    team_id: game.self_id.clone(),
                    ready: Some(true),
                },
            ],
        }
    }

    /// Apply the predicted outcome of `action` and track it until the
    /// server answers
    pub fn begin(&mut self, action: &Action) -> MutationId {
        let patches = self.predict(action);
        self.pending.begin(&mut self.game, patches)
    }

    pub fn confirm(&mut self, id: MutationId) -> bool {
        self.pending.confirm(id)
    }

    /// Roll back a rejected mutation
    pub fn reject(&mut self, id: MutationId) -> usize {
        self.pending.reject(&mut self.game, id)
    }

    /// Feed one realtime envelope through the filter and into the local copy
    pub fn receive(&mut self, envelope: &EventEnvelope) -> Received {
        match self.reconciler.admit(envelope) {
            Admission::OwnSession => Received::OwnSession,
            Admission::Stale { .. } => Received::Stale,
            Admission::Fresh => match self.game.apply_event(&envelope.event) {
                ApplyOutcome::Applied => Received::Applied,
                ApplyOutcome::Ignored => Received::Ignored,
                ApplyOutcome::NeedsRefetch => {
                    tracing::debug!(
                        kind = %envelope.event.kind(),
                        game_id = %self.game.id,
                        "Event does not fit local state, refetch needed"
                    );
                    self.needs_refetch = true;
                    Received::NeedsRefetch
                }
            },
        }
    }

    /// Replace the local snapshot with a fresh one from the server.
    /// Pending inverses refer to the old copy and are dropped.
    pub fn resync(&mut self, snapshot: GameSnapshot) {
        self.game.refresh(snapshot);
        self.pending.clear();
        self.needs_refetch = false;
    }

    fn own_team(&self) -> Option<&TeamView> {
        self.game.teams.get(&self.game.self_id)
    }
}
