//! Ranking repository for database operations.

use domain::models::NewRanking;
use sqlx::PgConnection;

use crate::entities::RankingEntity;
use crate::metrics::QueryTimer;

/// Repository for final attempt scores.
pub struct RankingRepository;

impl RankingRepository {
    /// Insert the ranking of an attempt.
    ///
    /// Uses INSERT ... ON CONFLICT DO NOTHING on `attempt_uid`, then returns the
    /// stored row (new or existing).
    pub async fn insert(
        conn: &mut PgConnection,
        ranking: &NewRanking,
    ) -> Result<RankingEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_ranking");

        sqlx::query(
            r#"
            INSERT INTO rankings (match_uid, user_uid, attempt_uid, score)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (attempt_uid) DO NOTHING
            "#,
        )
        .bind(ranking.match_uid)
        .bind(ranking.user_uid)
        .bind(&ranking.attempt_uid)
        .bind(ranking.score)
        .execute(&mut *conn)
        .await?;

        let result = sqlx::query_as::<_, RankingEntity>(
            r#"
            SELECT uid, match_uid, user_uid, attempt_uid, score, created_at
            FROM rankings
            WHERE attempt_uid = $1
            "#,
        )
        .bind(&ranking.attempt_uid)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    /// Rankings of a match, best score first.
    pub async fn find_by_match(
        conn: &mut PgConnection,
        match_uid: i64,
    ) -> Result<Vec<RankingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_rankings_by_match");
        let result = sqlx::query_as::<_, RankingEntity>(
            r#"
            SELECT uid, match_uid, user_uid, attempt_uid, score, created_at
            FROM rankings
            WHERE match_uid = $1
            ORDER BY score DESC, created_at ASC
            "#,
        )
        .bind(match_uid)
        .fetch_all(conn)
        .await;
        timer.record();
        result
    }
}
