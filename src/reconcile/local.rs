use crate::protocol::Event;
use crate::sequencer::WordSequencer;
use crate::types::*;
use crate::views::*;
use std::collections::BTreeMap;

/// Guessing-phase data a client tracks per word
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalGuessing {
    /// Own vote, masked
    pub vote: Option<MaskedId>,
    pub readiness: BTreeMap<UserId, bool>,
    pub reveal_map: Option<RevealMap>,
}

/// What applying an event did to the local copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Event did not touch anything this copy tracks
    Ignored,
    /// Local copy disagrees with the event; fetch a fresh snapshot
    NeedsRefetch,
}

/// A client's copy of one game
#[derive(Debug, Clone, PartialEq)]
pub struct LocalGame {
    pub id: GameId,
    pub self_id: UserId,
    pub is_owner: bool,
    pub state: GameState,
    pub teams: BTreeMap<UserId, TeamView>,
    pub words: BTreeMap<WordId, WordView>,
    /// word -> team -> decoy submitted
    pub proposal_readiness: BTreeMap<WordId, BTreeMap<UserId, bool>>,
    pub guessing: BTreeMap<WordId, LocalGuessing>,
}

impl LocalGame {
    pub fn from_snapshot(self_id: impl Into<UserId>, snapshot: GameSnapshot) -> Self {
        Self {
            id: snapshot.id,
            self_id: self_id.into(),
            is_owner: snapshot.is_owner,
            state: snapshot.state,
            teams: snapshot.teams,
            words: snapshot.words,
            proposal_readiness: BTreeMap::new(),
            guessing: BTreeMap::new(),
        }
    }

    /// Replace the snapshot part, keeping per-phase data
    pub fn refresh(&mut self, snapshot: GameSnapshot) {
        self.is_owner = snapshot.is_owner;
        self.state = snapshot.state;
        self.teams = snapshot.teams;
        self.words = snapshot.words;
        self.proposal_readiness
            .retain(|word_id, _| self.words.contains_key(word_id));
        self.guessing
            .retain(|word_id, _| self.words.contains_key(word_id));
    }

    pub fn load_player_definitions(&mut self, views: BTreeMap<WordId, PlayerProposalView>) {
        for (word_id, view) in views {
            if let Some(word) = self.words.get_mut(&word_id) {
                word.definition = view.definition.clone();
            }
            let mut readiness = view.readiness;
            readiness.insert(self.self_id.clone(), view.definition.is_some());
            self.proposal_readiness.insert(word_id, readiness);
        }
    }

    pub fn load_admin_definitions(&mut self, views: BTreeMap<WordId, AdminProposalView>) {
        self.proposal_readiness.extend(views);
    }

    pub fn load_player_guessing(&mut self, views: BTreeMap<WordId, PlayerGuessingView>) {
        for (word_id, view) in views {
            self.guessing.insert(
                word_id,
                LocalGuessing {
                    vote: view.vote,
                    readiness: view.readiness,
                    reveal_map: view.reveal_map,
                },
            );
        }
    }

    pub fn load_admin_guessing(&mut self, views: BTreeMap<WordId, AdminGuessingView>) {
        for (word_id, view) in views {
            self.guessing.insert(
                word_id,
                LocalGuessing {
                    vote: None,
                    readiness: view.readiness,
                    reveal_map: view.reveal_map,
                },
            );
        }
    }

    pub fn sequencer(&self) -> WordSequencer {
        WordSequencer::new(self.words.values().map(|w| w.position))
    }

    /// Fold one event into the local copy. Every event is an idempotent
    /// overwrite, so applying the same event twice changes nothing further.
    pub fn apply_event(&mut self, event: &Event) -> ApplyOutcome {
        match event {
            Event::GameState { state } => {
                self.state = *state;
                ApplyOutcome::Applied
            }
            Event::GameCurrentPosition { current_position } => {
                match self.state.with_position(*current_position) {
                    Some(state) => {
                        self.state = state;
                        ApplyOutcome::Applied
                    }
                    // phase change not seen yet
                    None => ApplyOutcome::NeedsRefetch,
                }
            }
            Event::GameStart { team_ids } => {
                let mut expected = team_ids.clone();
                expected.sort();
                let local: Vec<&UserId> = self.teams.keys().collect();
                if local != expected.iter().collect::<Vec<_>>() {
                    return ApplyOutcome::NeedsRefetch;
                }
                match self.sequencer().first_position() {
                    Ok(current_position) => {
                        self.state = GameState::Proposal { current_position };
                        ApplyOutcome::Applied
                    }
                    Err(_) => ApplyOutcome::NeedsRefetch,
                }
            }
            Event::TeamJoin { user_id, nickname } => {
                self.teams
                    .entry(user_id.clone())
                    .and_modify(|t| t.nickname = nickname.clone())
                    .or_insert_with(|| TeamView {
                        nickname: nickname.clone(),
                        ready: false,
                    });
                ApplyOutcome::Applied
            }
            Event::TeamLeave { user_id } => match self.teams.remove(user_id) {
                Some(_) => ApplyOutcome::Applied,
                None => ApplyOutcome::Ignored,
            },
            Event::TeamReadiness { user_id, ready } => match self.teams.get_mut(user_id) {
                Some(team) => {
                    team.ready = *ready;
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::NeedsRefetch,
            },
            Event::TeamNickname { user_id, nickname } => match self.teams.get_mut(user_id) {
                Some(team) => {
                    team.nickname = nickname.clone();
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::NeedsRefetch,
            },
            Event::WordAdd { id, position, term } => {
                let word = self.words.entry(id.clone()).or_insert_with(|| WordView {
                    position: *position,
                    term: term.clone(),
                    definition: None,
                });
                word.position = *position;
                word.term = term.clone();
                ApplyOutcome::Applied
            }
            Event::WordRemove { id } => {
                self.proposal_readiness.remove(id);
                self.guessing.remove(id);
                match self.words.remove(id) {
                    Some(_) => ApplyOutcome::Applied,
                    None => ApplyOutcome::Ignored,
                }
            }
            Event::WordTermUpdate { word_id, term } => match self.words.get_mut(word_id) {
                Some(word) => {
                    word.term = term.clone();
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::NeedsRefetch,
            },
            Event::DefinitionReady {
                word_id,
                team_id,
                ready,
            } => {
                self.proposal_readiness
                    .entry(word_id.clone())
                    .or_default()
                    .insert(team_id.clone(), *ready);
                ApplyOutcome::Applied
            }
            Event::GuessingReady {
                word_id,
                team_id,
                ready,
            } => {
                self.guessing
                    .entry(word_id.clone())
                    .or_default()
                    .readiness
                    .insert(team_id.clone(), *ready);
                ApplyOutcome::Applied
            }
            Event::GuessingReveal { word_id, mapping } => {
                self.guessing.entry(word_id.clone()).or_default().reveal_map =
                    Some(mapping.clone());
                ApplyOutcome::Applied
            }
        }
    }
}
