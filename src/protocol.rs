use crate::types::*;
use crate::views::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION: &str = "1";

/// Realtime change notification, one variant per kind.
///
/// Serialized adjacently: `{"kind":"team:join","payload":{...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload")]
pub enum Event {
    #[serde(rename = "game:state")]
    GameState { state: GameState },

    #[serde(rename = "game:currentPosition", rename_all = "camelCase")]
    GameCurrentPosition { current_position: Position },

    #[serde(rename = "game:start", rename_all = "camelCase")]
    GameStart { team_ids: Vec<UserId> },

    #[serde(rename = "team:join", rename_all = "camelCase")]
    TeamJoin { user_id: UserId, nickname: String },

    #[serde(rename = "team:leave", rename_all = "camelCase")]
    TeamLeave { user_id: UserId },

    #[serde(rename = "team:readiness", rename_all = "camelCase")]
    TeamReadiness { user_id: UserId, ready: bool },

    #[serde(rename = "team:nickname", rename_all = "camelCase")]
    TeamNickname { user_id: UserId, nickname: String },

    /// Carries no definition: the real one must not reach the teams
    #[serde(rename = "word:add")]
    WordAdd {
        id: WordId,
        position: Position,
        term: String,
    },

    #[serde(rename = "word:remove")]
    WordRemove { id: WordId },

    #[serde(rename = "word:term-update", rename_all = "camelCase")]
    WordTermUpdate { word_id: WordId, term: String },

    #[serde(rename = "definition:ready", rename_all = "camelCase")]
    DefinitionReady {
        word_id: WordId,
        team_id: UserId,
        ready: bool,
    },

    #[serde(rename = "guessing:ready", rename_all = "camelCase")]
    GuessingReady {
        word_id: WordId,
        team_id: UserId,
        ready: bool,
    },

    #[serde(rename = "guessing:reveal", rename_all = "camelCase")]
    GuessingReveal { word_id: WordId, mapping: RevealMap },
}

/// Payload-free event discriminant, the key of per-kind staleness tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    GameState,
    GameCurrentPosition,
    GameStart,
    TeamJoin,
    TeamLeave,
    TeamReadiness,
    TeamNickname,
    WordAdd,
    WordRemove,
    WordTermUpdate,
    DefinitionReady,
    GuessingReady,
    GuessingReveal,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GameState => "game:state",
            EventKind::GameCurrentPosition => "game:currentPosition",
            EventKind::GameStart => "game:start",
            EventKind::TeamJoin => "team:join",
            EventKind::TeamLeave => "team:leave",
            EventKind::TeamReadiness => "team:readiness",
            EventKind::TeamNickname => "team:nickname",
            EventKind::WordAdd => "word:add",
            EventKind::WordRemove => "word:remove",
            EventKind::WordTermUpdate => "word:term-update",
            EventKind::DefinitionReady => "definition:ready",
            EventKind::GuessingReady => "guessing:ready",
            EventKind::GuessingReveal => "guessing:reveal",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::GameState { .. } => EventKind::GameState,
            Event::GameCurrentPosition { .. } => EventKind::GameCurrentPosition,
            Event::GameStart { .. } => EventKind::GameStart,
            Event::TeamJoin { .. } => EventKind::TeamJoin,
            Event::TeamLeave { .. } => EventKind::TeamLeave,
            Event::TeamReadiness { .. } => EventKind::TeamReadiness,
            Event::TeamNickname { .. } => EventKind::TeamNickname,
            Event::WordAdd { .. } => EventKind::WordAdd,
            Event::WordRemove { .. } => EventKind::WordRemove,
            Event::WordTermUpdate { .. } => EventKind::WordTermUpdate,
            Event::DefinitionReady { .. } => EventKind::DefinitionReady,
            Event::GuessingReady { .. } => EventKind::GuessingReady,
            Event::GuessingReveal { .. } => EventKind::GuessingReveal,
        }
    }
}

/// An [`Event`] as delivered on a game channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: Event,
    /// Server clock in milliseconds, strictly increasing across all events
    pub timestamp: i64,
    /// Session that caused the change
    pub session_id: SessionId,
}

/// Client request: an operation plus a correlation id echoed in the reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRequest {
    pub request_id: String,
    #[serde(flatten)]
    pub message: ClientMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Receive this game's events on the current socket
    Subscribe {
        game_id: GameId,
    },

    CreateGame,
    ListGames,
    GetGame {
        game_id: GameId,
    },
    StartGame {
        game_id: GameId,
        team_ids: Vec<UserId>,
    },
    ChangeState {
        game_id: GameId,
        direction: Direction,
    },
    ChangePosition {
        game_id: GameId,
        direction: Direction,
    },

    JoinTeam {
        game_id: GameId,
        nickname: String,
    },
    LeaveTeam {
        game_id: GameId,
    },
    /// Owner only
    KickTeam {
        game_id: GameId,
        team_id: UserId,
    },
    ChangeReadiness {
        game_id: GameId,
        ready: bool,
    },
    ChangeNickname {
        game_id: GameId,
        nickname: String,
    },

    PutWord {
        game_id: GameId,
        term: String,
        definition: String,
    },
    RemoveWord {
        word_id: WordId,
    },
    ChangeTerm {
        word_id: WordId,
        term: String,
    },
    ChangeDefinition {
        word_id: WordId,
        definition: String,
    },

    /// Submit or clear a decoy. `None` clears it.
    PutDefinition {
        word_id: WordId,
        definition: Option<String>,
    },
    Vote {
        word_id: WordId,
        guess: MaskedId,
    },
    Reveal {
        word_id: WordId,
    },

    GetPlayerDefinitions {
        game_id: GameId,
    },
    GetAdminDefinitions {
        game_id: GameId,
    },
    GetPlayerGuessing {
        game_id: GameId,
    },
    GetAdminGuessing {
        game_id: GameId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        user_id: UserId,
        session_id: SessionId,
        server_now: String,
    },
    /// Mutation applied, nothing else to report
    Ack {
        request_id: String,
    },
    Subscribed {
        request_id: String,
        game_id: GameId,
    },
    GameCreated {
        request_id: String,
        game: GameSummary,
    },
    Games {
        request_id: String,
        games: Vec<GameSummary>,
    },
    Snapshot {
        request_id: String,
        snapshot: GameSnapshot,
    },
    StateChanged {
        request_id: String,
        state: GameState,
    },
    WordCreated {
        request_id: String,
        word_id: WordId,
        position: Position,
    },
    Revealed {
        request_id: String,
        word_id: WordId,
        mapping: RevealMap,
    },
    PlayerDefinitions {
        request_id: String,
        words: BTreeMap<WordId, PlayerProposalView>,
    },
    AdminDefinitions {
        request_id: String,
        words: BTreeMap<WordId, AdminProposalView>,
    },
    PlayerGuessing {
        request_id: String,
        words: BTreeMap<WordId, PlayerGuessingView>,
    },
    AdminGuessing {
        request_id: String,
        words: BTreeMap<WordId, AdminGuessingView>,
    },
    Event {
        envelope: EventEnvelope,
    },
    Error {
        request_id: Option<String>,
        code: String,
        msg: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = EventEnvelope {
            event: Event::GuessingReady {
                word_id: "w1".into(),
                team_id: "t1".into(),
                ready: true,
            },
            timestamp: 1_700_000_000_000,
            session_id: "s1".into(),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "guessing:ready",
                "payload": {"wordId": "w1", "teamId": "t1", "ready": true},
                "timestamp": 1_700_000_000_000i64,
                "sessionId": "s1",
            })
        );

        let back: EventEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_game_state_event_nests_phase() {
        let event = Event::GameState {
            state: GameState::Proposal {
                current_position: 2,
            },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"kind": "game:state", "payload": {"state": {"phase": "proposal", "currentPosition": 2}}})
        );
    }

    #[test]
    fn test_kind_names_match_wire_tags() {
        let events = [
            Event::GameCurrentPosition {
                current_position: 1,
            },
            Event::GameStart { team_ids: vec![] },
            Event::WordTermUpdate {
                word_id: "w".into(),
                term: "t".into(),
            },
            Event::GuessingReveal {
                word_id: "w".into(),
                mapping: RevealMap::new(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["kind"], event.kind().as_str());
        }
    }

    #[test]
    fn test_client_request_parses_flat() {
        let raw = r#"{"request_id":"r1","t":"vote","word_id":"w1","guess":"abcd"}"#;
        let req: ClientRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.request_id, "r1");
        assert!(matches!(
            req.message,
            ClientMessage::Vote { ref word_id, ref guess } if word_id == "w1" && guess == "abcd"
        ));
    }

    #[test]
    fn test_error_message_shape() {
        let msg = ServerMessage::Error {
            request_id: Some("r9".into()),
            code: "FORBIDDEN".into(),
            msg: "nope".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"t": "error", "request_id": "r9", "code": "FORBIDDEN", "msg": "nope"})
        );
    }
}
