use crate::mask::MaskError;
use crate::sequencer::SequencerError;

/// Result type for engine operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur while applying an operation to a game.
///
/// Every variant except [`GameError::Invariant`] is an ordinary rejection:
/// nothing was written and the caller may roll back and retry.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    #[error(transparent)]
    Mask(#[from] MaskError),

    /// Stored data contradicts what the current phase guarantees
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl GameError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Stable code sent to clients alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::Forbidden(_) => "FORBIDDEN",
            GameError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            GameError::InvalidInput(_) => "INVALID_INPUT",
            GameError::Sequencer(SequencerError::Empty) => "NO_WORDS",
            GameError::Sequencer(SequencerError::UnknownPosition(_)) => "UNKNOWN_POSITION",
            GameError::Sequencer(_) => "SEQUENCER_BOUNDARY",
            GameError::Mask(_) => "INVALID_TOKEN",
            GameError::Invariant(_) => "INVARIANT_VIOLATION",
        }
    }

    pub fn is_defect(&self) -> bool {
        matches!(self, GameError::Invariant(_))
    }
}
