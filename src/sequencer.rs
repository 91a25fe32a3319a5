//! Turn order over a game's words.
//!
//! Words are ordered by `position` ascending. Positions are unique within a
//! game, so "next" and "previous" are always well defined.

use crate::types::{Direction, Position};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("Game has no words")]
    Empty,

    #[error("No word at position {0}")]
    UnknownPosition(Position),

    #[error("Position {0} is already the first word")]
    PastFirst(Position),

    #[error("Position {0} is already the last word")]
    PastLast(Position),
}

/// Snapshot of the word positions of one game
#[derive(Debug, Clone, Default)]
pub struct WordSequencer {
    positions: Vec<Position>,
}

impl WordSequencer {
    pub fn new(positions: impl IntoIterator<Item = Position>) -> Self {
        let mut positions: Vec<Position> = positions.into_iter().collect();
        positions.sort_unstable();
        positions.dedup();
        Self { positions }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn first_position(&self) -> Result<Position, SequencerError> {
        self.positions.first().copied().ok_or(SequencerError::Empty)
    }

    pub fn last_position(&self) -> Result<Position, SequencerError> {
        self.positions.last().copied().ok_or(SequencerError::Empty)
    }

    pub fn next(&self, current: Position) -> Result<Position, SequencerError> {
        let index = self.index_of(current)?;
        self.positions
            .get(index + 1)
            .copied()
            .ok_or(SequencerError::PastLast(current))
    }

    pub fn previous(&self, current: Position) -> Result<Position, SequencerError> {
        let index = self.index_of(current)?;
        index
            .checked_sub(1)
            .map(|i| self.positions[i])
            .ok_or(SequencerError::PastFirst(current))
    }

    pub fn step(
        &self,
        current: Position,
        direction: Direction,
    ) -> Result<Position, SequencerError> {
        match direction {
            Direction::Forward => self.next(current),
            Direction::Backward => self.previous(current),
        }
    }

    /// Position that follows the last one, used when appending a word
    pub fn next_free_position(&self) -> Position {
        self.positions.last().map_or(0, |last| last + 1)
    }

    fn index_of(&self, current: Position) -> Result<usize, SequencerError> {
        self.positions
            .binary_search(&current)
            .map_err(|_| SequencerError::UnknownPosition(current))
    }
}
