//! Store seam used by the play engine.
//!
//! The engine never caches match or attempt state; every request reads the
//! authoritative rows through a [`PlayStore`]. The Postgres implementation
//! wraps a single transaction so that validation and the subsequent write see
//! the same snapshot.

use async_trait::async_trait;

use crate::models::{
    AnswerRecord, Match, MatchPlan, NewRanking, NewReaction, NewUser, OpenAnswer, Ranking,
    Reaction, ReactionFilter, User,
};

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Match {0} already has reactions and cannot be modified")]
    Frozen(i64),

    #[error("Store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".into()),
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Queries and writes needed by validators, the engine and the ranking writer.
#[async_trait]
pub trait PlayStore: Send {
    async fn find_match(&mut self, match_uid: i64) -> Result<Option<Match>, StoreError>;

    async fn find_match_by_uhash(&mut self, uhash: &str) -> Result<Option<Match>, StoreError>;

    /// Codes are reused once a match expires; the most recently created match wins.
    async fn find_match_by_code(&mut self, code: &str) -> Result<Option<Match>, StoreError>;

    /// Loads games (by index), questions (by position) and answers of a match.
    async fn load_plan(&mut self, info: Match) -> Result<MatchPlan, StoreError>;

    async fn find_user(&mut self, user_uid: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_digests(
        &mut self,
        email_digest: &str,
        token_digest: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError>;

    /// Holds the user's row until the transaction ends, serialising attempt
    /// bookkeeping of one player.
    async fn lock_user(&mut self, user_uid: i64) -> Result<(), StoreError>;

    async fn insert_open_answer(&mut self, text: &str) -> Result<OpenAnswer, StoreError>;

    /// Reactions matching `filter`, oldest first.
    async fn reactions(&mut self, filter: &ReactionFilter) -> Result<Vec<Reaction>, StoreError>;

    /// Most recent reaction matching `filter`, locked for the rest of the transaction.
    async fn lock_reaction(
        &mut self,
        filter: &ReactionFilter,
    ) -> Result<Option<Reaction>, StoreError>;

    async fn insert_reaction(&mut self, reaction: NewReaction) -> Result<Reaction, StoreError>;

    /// Writes an answer onto a reaction that has none yet.
    ///
    /// Returns `None` when the reaction was already answered.
    async fn record_answer(
        &mut self,
        reaction_uid: i64,
        record: AnswerRecord,
    ) -> Result<Option<Reaction>, StoreError>;

    /// Inserts the ranking of an attempt; replays for the same attempt return the stored row.
    async fn insert_ranking(&mut self, ranking: NewRanking) -> Result<Ranking, StoreError>;

    /// Rankings of a match, best score first.
    async fn rankings(&mut self, match_uid: i64) -> Result<Vec<Ranking>, StoreError>;
}
