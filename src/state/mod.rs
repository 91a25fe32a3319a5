mod definition;
mod game;
mod team;
mod views;
mod word;

pub use game::generate_game_id;

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::error::{GameError, GameResult};
use crate::mask::Masker;
use crate::protocol::{Event, EventEnvelope};
use crate::sequencer::WordSequencer;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// All persisted records.
///
/// Every operation runs its checks and its writes under one write guard,
/// so a precondition read at the start still holds at commit.
#[derive(Debug, Default)]
pub struct Store {
    pub users: HashSet<UserId>,
    pub games: HashMap<GameId, Game>,
    /// Keyed by (game, team user)
    pub teams: HashMap<(GameId, UserId), Team>,
    pub words: HashMap<WordId, Word>,
    /// Keyed by (word, team user)
    pub definitions: HashMap<(WordId, UserId), Definition>,
    /// Reveal maps frozen at the first reveal of each word
    pub reveals: HashMap<WordId, RevealMap>,
}

impl Store {
    pub fn game(&self, game_id: &str) -> GameResult<&Game> {
        self.games
            .get(game_id)
            .ok_or_else(|| GameError::not_found(format!("Game {game_id} not found")))
    }

    pub fn game_mut(&mut self, game_id: &str) -> GameResult<&mut Game> {
        self.games
            .get_mut(game_id)
            .ok_or_else(|| GameError::not_found(format!("Game {game_id} not found")))
    }

    /// The game, provided `user_id` owns it
    pub fn owned_game(&self, game_id: &str, user_id: &str) -> GameResult<&Game> {
        let game = self.game(game_id)?;
        if game.owner_id != user_id {
            return Err(GameError::forbidden("Only the game owner can do this"));
        }
        Ok(game)
    }

    pub fn word(&self, word_id: &str) -> GameResult<&Word> {
        self.words
            .get(word_id)
            .ok_or_else(|| GameError::not_found(format!("Word {word_id} not found")))
    }

    pub fn team(&self, game_id: &str, user_id: &str) -> GameResult<&Team> {
        self.teams
            .get(&(game_id.to_string(), user_id.to_string()))
            .ok_or_else(|| GameError::forbidden("You don't participate in this game"))
    }

    pub fn is_team(&self, game_id: &str, user_id: &str) -> bool {
        self.teams
            .contains_key(&(game_id.to_string(), user_id.to_string()))
    }

    /// Teams of a game, ordered by user id
    pub fn teams_of(&self, game_id: &str) -> Vec<&Team> {
        let mut teams: Vec<&Team> = self
            .teams
            .values()
            .filter(|t| t.game_id == game_id)
            .collect();
        teams.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        teams
    }

    /// Words of a game, ordered by position
    pub fn words_of(&self, game_id: &str) -> Vec<&Word> {
        let mut words: Vec<&Word> = self
            .words
            .values()
            .filter(|w| w.game_id == game_id)
            .collect();
        words.sort_by_key(|w| w.position);
        words
    }

    pub fn sequencer(&self, game_id: &str) -> WordSequencer {
        WordSequencer::new(self.words_of(game_id).into_iter().map(|w| w.position))
    }

    pub fn definition(&self, word_id: &str, user_id: &str) -> Option<&Definition> {
        self.definitions
            .get(&(word_id.to_string(), user_id.to_string()))
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    pub broadcaster: Arc<Broadcaster>,
    pub masker: Masker,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            broadcaster: Arc::new(Broadcaster::new(config.channel_capacity)),
            masker: Masker::new(config.mask_key),
        }
    }

    /// Record a user id. Returns `true` when it was not known before.
    pub async fn register_user(&self, user_id: &UserId) -> bool {
        self.store.write().await.users.insert(user_id.clone())
    }

    /// Mint a fresh user id
    pub async fn create_user(&self) -> UserId {
        let user_id = ulid::Ulid::new().to_string();
        self.register_user(&user_id).await;
        tracing::info!(user_id = %user_id, "User created");
        user_id
    }

    async fn emit(&self, actor: &Actor, game_id: &str, event: Event) -> EventEnvelope {
        self.broadcaster
            .emit(&actor.session_id, game_id, event)
            .await
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

pub(crate) fn validate_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> GameResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(GameError::invalid(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}
