//! Pure phase transitions. Both the server and the client-side predictor
//! run these against a [`WordSequencer`] built from the game's words.
//!
//! ```text
//!            forward            forward              forward
//!   start ----------> proposal ---------> guessing ---------> finish
//!         <----------          <---------          <---------
//!           backward   (last)   backward   (last)   backward
//! ```
//!
//! Entering a positional phase forward lands on the first word, backward on
//! the last one. Forward from start only happens through `start`.

use crate::error::{GameError, GameResult};
use crate::sequencer::WordSequencer;
use crate::types::{Direction, GameState};

/// State a game enters when it starts
pub fn start_state(words: &WordSequencer) -> GameResult<GameState> {
    Ok(GameState::Proposal {
        current_position: words.first_position()?,
    })
}

/// Move to the neighbouring phase
pub fn transition(
    state: GameState,
    direction: Direction,
    words: &WordSequencer,
) -> GameResult<GameState> {
    match (state, direction) {
        (GameState::Start, Direction::Forward) => Err(GameError::forbidden(
            "A game leaves the start phase only by being started",
        )),
        (GameState::Start, Direction::Backward) => Err(GameError::precondition(
            "Game is already in its first phase",
        )),
        (GameState::Proposal { .. }, Direction::Forward) => Ok(GameState::Guessing {
            current_position: words.first_position()?,
        }),
        (GameState::Proposal { .. }, Direction::Backward) => Ok(GameState::Start),
        (GameState::Guessing { .. }, Direction::Forward) => Ok(GameState::Finish),
        (GameState::Guessing { .. }, Direction::Backward) => Ok(GameState::Proposal {
            current_position: words.last_position()?,
        }),
        (GameState::Finish, Direction::Forward) => {
            Err(GameError::precondition("Game is already finished"))
        }
        (GameState::Finish, Direction::Backward) => Ok(GameState::Guessing {
            current_position: words.last_position()?,
        }),
    }
}

/// Move the turn cursor within the current phase
pub fn advance_position(
    state: GameState,
    direction: Direction,
    words: &WordSequencer,
) -> GameResult<GameState> {
    let current = state.current_position().ok_or_else(|| {
        GameError::precondition(format!(
            "Position cannot be changed in the {} phase",
            state.phase()
        ))
    })?;
    let next = words.step(current, direction)?;
    state
        .with_position(next)
        .ok_or_else(|| GameError::invariant("positional phase lost its cursor"))
}
