//! Reaction repository for database operations.
//!
//! Reactions are filtered through [`ReactionFilter`]; optional filter fields
//! are bound as NULL and skipped by the `($n IS NULL OR ...)` guards.

use chrono::{DateTime, Utc};
use domain::models::{AnswerRecord, NewReaction, ReactionFilter};
use sqlx::PgConnection;

use crate::entities::{OpenAnswerEntity, ReactionEntity};
use crate::metrics::QueryTimer;

const REACTION_COLUMNS: &str = "uid, match_uid, question_uid, game_uid, user_uid, answer_uid, \
    open_answer_uid, create_timestamp, answer_time, score, attempt_uid";

const FILTER_CLAUSE: &str = r#"
    WHERE user_uid = $1 AND match_uid = $2
      AND ($3::bigint IS NULL OR question_uid = $3)
      AND ($4::bigint IS NULL OR game_uid = $4)
      AND ($5::text IS NULL OR attempt_uid = $5)
      AND (NOT $6 OR (answer_uid IS NULL AND open_answer_uid IS NULL))
"#;

/// Repository for reactions and their free-text answers.
pub struct ReactionRepository;

impl ReactionRepository {
    /// Reactions matching `filter`, oldest first.
    pub async fn find(
        conn: &mut PgConnection,
        filter: &ReactionFilter,
    ) -> Result<Vec<ReactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_reactions");
        let result = sqlx::query_as::<_, ReactionEntity>(&format!(
            "SELECT {} FROM reactions {} ORDER BY create_timestamp ASC, uid ASC",
            REACTION_COLUMNS, FILTER_CLAUSE
        ))
        .bind(filter.user_uid)
        .bind(filter.match_uid)
        .bind(filter.question_uid)
        .bind(filter.game_uid)
        .bind(&filter.attempt_uid)
        .bind(filter.pending_only)
        .fetch_all(conn)
        .await;
        timer.record();
        result
    }

    /// Most recent reaction matching `filter`, locked until the transaction ends.
    pub async fn lock_latest(
        conn: &mut PgConnection,
        filter: &ReactionFilter,
    ) -> Result<Option<ReactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_reaction");
        let result = sqlx::query_as::<_, ReactionEntity>(&format!(
            "SELECT {} FROM reactions {} ORDER BY create_timestamp DESC, uid DESC LIMIT 1 FOR UPDATE",
            REACTION_COLUMNS, FILTER_CLAUSE
        ))
        .bind(filter.user_uid)
        .bind(filter.match_uid)
        .bind(filter.question_uid)
        .bind(filter.game_uid)
        .bind(&filter.attempt_uid)
        .bind(filter.pending_only)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Insert a reaction displayed at `displayed_at`.
    pub async fn insert(
        conn: &mut PgConnection,
        reaction: &NewReaction,
        displayed_at: DateTime<Utc>,
    ) -> Result<ReactionEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_reaction");
        let result = sqlx::query_as::<_, ReactionEntity>(&format!(
            r#"
            INSERT INTO reactions (match_uid, question_uid, game_uid, user_uid,
                                   create_timestamp, attempt_uid)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REACTION_COLUMNS
        ))
        .bind(reaction.match_uid)
        .bind(reaction.question_uid)
        .bind(reaction.game_uid)
        .bind(reaction.user_uid)
        .bind(displayed_at)
        .bind(&reaction.attempt_uid)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    /// Write an answer onto a reaction that has none.
    ///
    /// Returns `None` when the reaction already holds an answer.
    pub async fn record_answer(
        conn: &mut PgConnection,
        reaction_uid: i64,
        record: &AnswerRecord,
    ) -> Result<Option<ReactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("record_answer");
        let result = sqlx::query_as::<_, ReactionEntity>(&format!(
            r#"
            UPDATE reactions
            SET answer_uid = $2, open_answer_uid = $3, answer_time = $4, score = $5
            WHERE uid = $1 AND answer_uid IS NULL AND open_answer_uid IS NULL
            RETURNING {}
            "#,
            REACTION_COLUMNS
        ))
        .bind(reaction_uid)
        .bind(record.answer_uid)
        .bind(record.open_answer_uid)
        .bind(record.answer_time)
        .bind(record.score)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Store a free-text answer.
    pub async fn insert_open_answer(
        conn: &mut PgConnection,
        text: &str,
    ) -> Result<OpenAnswerEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_open_answer");
        let result = sqlx::query_as::<_, OpenAnswerEntity>(
            r#"
            INSERT INTO open_answers (text)
            VALUES ($1)
            RETURNING uid, text
            "#,
        )
        .bind(text)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }
}
