//! Ranking entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the rankings table.
#[derive(Debug, Clone, FromRow)]
pub struct RankingEntity {
    pub uid: i64,
    pub match_uid: i64,
    pub user_uid: i64,
    pub attempt_uid: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl From<RankingEntity> for domain::models::Ranking {
    fn from(entity: RankingEntity) -> Self {
        Self {
            uid: entity.uid,
            match_uid: entity.match_uid,
            user_uid: entity.user_uid,
            attempt_uid: entity.attempt_uid,
            score: entity.score,
            created_at: entity.created_at,
        }
    }
}
