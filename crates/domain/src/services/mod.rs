//! Play engine services.
//!
//! Everything here talks to storage through [`PlayStore`] so the same code
//! runs against a Postgres transaction or the in-memory test store.

pub mod error;
pub mod identity;
pub mod iterators;
pub mod play;
pub mod player_status;
pub mod ranking;
pub mod scoring;
pub mod single_player;
pub mod store;
pub mod validators;

#[cfg(test)]
pub(crate) mod memory;

pub use error::PlayError;
pub use identity::Identity;
pub use iterators::{GameIterator, IterationError, QuestionIterator};
pub use play::{AttemptState, NextOutcome, PlayService, StartOutcome};
pub use player_status::{Attempt, PlayerStatus};
pub use ranking::RankingWriter;
pub use single_player::{Reply, SinglePlayer, Started};
pub use store::{PlayStore, StoreError};
