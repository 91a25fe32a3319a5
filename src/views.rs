//! Read models returned by queries.
//!
//! What a caller sees depends on who they are: the owner gets the real
//! definitions, a team gets its own decoy and masked versions of the rest.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub state: GameState,
    pub created_at: String,
}

impl From<&Game> for GameSummary {
    fn from(g: &Game) -> Self {
        Self {
            id: g.id.clone(),
            state: g.state,
            created_at: g.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamView {
    pub nickname: String,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordView {
    pub position: Position,
    pub term: String,
    /// Real definition for the owner, the caller's own decoy for a team
    pub definition: Option<String>,
}

/// Full state of one game as seen by one caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: GameId,
    pub state: GameState,
    pub is_owner: bool,
    pub teams: BTreeMap<UserId, TeamView>,
    pub words: BTreeMap<WordId, WordView>,
}

/// Proposal phase, team side: own decoy plus which other teams are done
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlayerProposalView {
    pub definition: Option<String>,
    pub readiness: BTreeMap<UserId, bool>,
}

/// Proposal phase, owner side: which teams submitted a decoy
pub type AdminProposalView = BTreeMap<UserId, bool>;

/// Guessing phase, team side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGuessingView {
    /// Every definition except the caller's own, keyed by masked author.
    /// The real one is keyed by the owner's masked id.
    pub definitions: BTreeMap<MaskedId, String>,
    /// The caller's own vote, masked
    pub vote: Option<MaskedId>,
    pub readiness: BTreeMap<UserId, bool>,
    pub reveal_map: Option<RevealMap>,
}

/// Guessing phase, owner side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminGuessingView {
    pub original_definition: String,
    pub definitions: BTreeMap<UserId, String>,
    pub readiness: BTreeMap<UserId, bool>,
    pub reveal_map: Option<RevealMap>,
}
