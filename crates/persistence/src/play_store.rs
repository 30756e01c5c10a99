//! Postgres-backed [`PlayStore`].
//!
//! One `PgPlayStore` wraps one transaction. Request handlers open it, run the
//! engine against it, and commit only when the engine returned `Ok`.

use async_trait::async_trait;
use chrono::Utc;
use domain::models::{
    AnswerRecord, Match, MatchPlan, NewRanking, NewReaction, NewUser, OpenAnswer, Ranking,
    Reaction, ReactionFilter, User,
};
use domain::services::{PlayStore, StoreError};
use sqlx::{PgPool, Postgres, Transaction};

use crate::repositories::{MatchRepository, RankingRepository, ReactionRepository, UserRepository};

pub struct PgPlayStore {
    tx: Transaction<'static, Postgres>,
}

impl PgPlayStore {
    /// Open a transaction on `pool`.
    pub async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    /// Discard every write made through this store.
    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

#[async_trait]
impl PlayStore for PgPlayStore {
    async fn find_match(&mut self, match_uid: i64) -> Result<Option<Match>, StoreError> {
        Ok(MatchRepository::find_by_uid(&mut self.tx, match_uid)
            .await?
            .map(Into::into))
    }

    async fn find_match_by_uhash(&mut self, uhash: &str) -> Result<Option<Match>, StoreError> {
        Ok(MatchRepository::find_by_uhash(&mut self.tx, uhash)
            .await?
            .map(Into::into))
    }

    async fn find_match_by_code(&mut self, code: &str) -> Result<Option<Match>, StoreError> {
        Ok(MatchRepository::find_by_code(&mut self.tx, code)
            .await?
            .map(Into::into))
    }

    async fn load_plan(&mut self, info: Match) -> Result<MatchPlan, StoreError> {
        Ok(MatchRepository::load_plan(&mut self.tx, info).await?)
    }

    async fn find_user(&mut self, user_uid: i64) -> Result<Option<User>, StoreError> {
        Ok(UserRepository::find_by_uid(&mut self.tx, user_uid)
            .await?
            .map(Into::into))
    }

    async fn find_user_by_digests(
        &mut self,
        email_digest: &str,
        token_digest: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(
            UserRepository::find_by_digests(&mut self.tx, email_digest, token_digest)
                .await?
                .map(Into::into),
        )
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        Ok(UserRepository::insert(&mut self.tx, &user).await?.into())
    }

    async fn lock_user(&mut self, user_uid: i64) -> Result<(), StoreError> {
        UserRepository::lock(&mut self.tx, user_uid)
            .await?
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_uid)))
    }

    async fn insert_open_answer(&mut self, text: &str) -> Result<OpenAnswer, StoreError> {
        Ok(ReactionRepository::insert_open_answer(&mut self.tx, text)
            .await?
            .into())
    }

    async fn reactions(&mut self, filter: &ReactionFilter) -> Result<Vec<Reaction>, StoreError> {
        let rows = ReactionRepository::find(&mut self.tx, filter).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn lock_reaction(
        &mut self,
        filter: &ReactionFilter,
    ) -> Result<Option<Reaction>, StoreError> {
        Ok(ReactionRepository::lock_latest(&mut self.tx, filter)
            .await?
            .map(Into::into))
    }

    async fn insert_reaction(&mut self, reaction: NewReaction) -> Result<Reaction, StoreError> {
        Ok(ReactionRepository::insert(&mut self.tx, &reaction, Utc::now())
            .await?
            .into())
    }

    async fn record_answer(
        &mut self,
        reaction_uid: i64,
        record: AnswerRecord,
    ) -> Result<Option<Reaction>, StoreError> {
        Ok(
            ReactionRepository::record_answer(&mut self.tx, reaction_uid, &record)
                .await?
                .map(Into::into),
        )
    }

    async fn insert_ranking(&mut self, ranking: NewRanking) -> Result<Ranking, StoreError> {
        Ok(RankingRepository::insert(&mut self.tx, &ranking).await?.into())
    }

    async fn rankings(&mut self, match_uid: i64) -> Result<Vec<Ranking>, StoreError> {
        let rows = RankingRepository::find_by_match(&mut self.tx, match_uid).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
