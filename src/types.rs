use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;
pub type UserId = String;
pub type WordId = String;
pub type SessionId = String;
/// Hex-encoded masked identity, scoped to one (game, word) pair
pub type MaskedId = String;

/// Word ordering key. Unique within a game, not necessarily contiguous.
pub type Position = i64;

/// Phase of a game with the data each phase carries.
///
/// Serialized the same way the realtime payloads and snapshots carry it:
/// `{"phase":"proposal","currentPosition":3}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum GameState {
    Start,
    Proposal {
        #[serde(rename = "currentPosition")]
        current_position: Position,
    },
    Guessing {
        #[serde(rename = "currentPosition")]
        current_position: Position,
    },
    Finish,
}

impl GameState {
    pub fn phase(&self) -> Phase {
        match self {
            GameState::Start => Phase::Start,
            GameState::Proposal { .. } => Phase::Proposal,
            GameState::Guessing { .. } => Phase::Guessing,
            GameState::Finish => Phase::Finish,
        }
    }

    /// Turn cursor, present only in the positional phases
    pub fn current_position(&self) -> Option<Position> {
        match self {
            GameState::Proposal { current_position } | GameState::Guessing { current_position } => {
                Some(*current_position)
            }
            GameState::Start | GameState::Finish => None,
        }
    }

    /// Same phase, cursor moved. `None` for phases without a cursor.
    pub fn with_position(&self, position: Position) -> Option<GameState> {
        match self {
            GameState::Proposal { .. } => Some(GameState::Proposal {
                current_position: position,
            }),
            GameState::Guessing { .. } => Some(GameState::Guessing {
                current_position: position,
            }),
            GameState::Start | GameState::Finish => None,
        }
    }
}

/// Payload-free view of [`GameState`], handy for messages and logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Proposal,
    Guessing,
    Finish,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Start => "start",
            Phase::Proposal => "proposal",
            Phase::Guessing => "guessing",
            Phase::Finish => "finish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub owner_id: UserId,
    pub state: GameState,
    /// ISO8601 creation timestamp
    pub created_at: String,
}

/// A participant of a game other than its owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub game_id: GameId,
    pub user_id: UserId,
    pub nickname: String,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Word {
    pub id: WordId,
    pub game_id: GameId,
    pub term: String,
    /// The real definition, authored by the owner
    pub definition: String,
    pub position: Position,
    pub revealed: bool,
}

/// A team's decoy for one word, and later its vote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Definition {
    pub word_id: WordId,
    pub user_id: UserId,
    pub definition: Option<String>,
    /// Real identity the team believes wrote the real definition.
    /// Equal to the game owner when the team picked the real one.
    pub guess_user_id: Option<UserId>,
}

/// One slot of a reveal: who hides behind a masked id and whom they voted for.
///
/// `vote` is `None` when the slot's owner picked the real definition
/// (and always for the game owner's own slot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealEntry {
    pub id: UserId,
    pub vote: Option<UserId>,
}

/// Masked id -> revealed identity and vote, for one word
pub type RevealMap = std::collections::BTreeMap<MaskedId, RevealEntry>;

/// Who is performing an operation, and from which connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub session_id: SessionId,
}

impl Actor {
    pub fn new(user_id: impl Into<UserId>, session_id: impl Into<SessionId>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Game id alphabet and length
pub const GAME_ID_ALPHABET: &[u8] = b"1234567890abcdef";
pub const GAME_ID_LENGTH: usize = 12;

pub const MIN_NICKNAME_LENGTH: usize = 2;
pub const MAX_NICKNAME_LENGTH: usize = 255;
pub const MIN_TERM_LENGTH: usize = 2;
pub const MAX_TERM_LENGTH: usize = 255;
pub const MIN_DEFINITION_LENGTH: usize = 2;
pub const MAX_DEFINITION_LENGTH: usize = 255;
