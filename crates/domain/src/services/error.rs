//! Errors raised by the play engine and its validators.

use super::iterators::IterationError;
use super::store::StoreError;

pub const EXPIRED_MATCH: &str = "Expired match";
pub const DUPLICATE_REACTIONS: &str = "Duplicate Reactions";
pub const INVALID_ATTEMPT_UID: &str = "Invalid attempt-uid";
pub const INVALID_REACTION: &str = "Invalid reaction";
pub const INVALID_ANSWER: &str = "Invalid answer";

#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A business rule was violated.
    #[error("{0}")]
    Validate(String),

    /// The user has no attempts left on this match.
    #[error("Match not playable: {0}")]
    MatchNotPlayable(String),

    #[error("{0}")]
    Match(String),

    /// Questions of the current game are exhausted.
    #[error("Game over")]
    GameOver,

    /// Every game and question of the match was displayed.
    #[error("Match over")]
    MatchOver,

    /// A treasure-hunt attempt ended on a wrong answer.
    #[error("Treasure hunt over")]
    HuntOver,

    #[error(transparent)]
    Store(StoreError),
}

impl PlayError {
    pub fn validate(msg: impl Into<String>) -> Self {
        PlayError::Validate(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        PlayError::NotFound(msg.into())
    }
}

impl From<StoreError> for PlayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => PlayError::NotFound(msg),
            StoreError::UniqueViolation(_) => PlayError::validate(DUPLICATE_REACTIONS),
            other => PlayError::Store(other),
        }
    }
}

impl From<IterationError> for PlayError {
    fn from(err: IterationError) -> Self {
        match err {
            IterationError::GameOver => PlayError::GameOver,
            IterationError::MatchOver => PlayError::MatchOver,
            IterationError::GameError(msg) | IterationError::MatchError(msg) => {
                PlayError::Match(msg)
            }
        }
    }
}
